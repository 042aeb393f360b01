//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding lookup table, and its name matches the seeded
//! `name` column.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lookup-table name, as exposed in API payloads.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Resolve a database ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( x if x == $val => Some(Self::$variant), )+
                    _ => None,
                }
            }

            /// `serialize_with` adapter rendering a stored ID as its name.
            pub fn serialize_id<S>(id: &StatusId, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(Self::from_id(*id).map_or("unknown", Self::name))
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }
    };
}

define_status_enum! {
    /// Project lifecycle status.
    ProjectStatus {
        Draft = 1 => "draft",
        Generating = 2 => "generating",
        Ready = 3 => "ready",
        Deployed = 4 => "deployed",
        Failed = 5 => "failed",
    }
}

define_status_enum! {
    /// Deployment lifecycle status.
    DeploymentStatus {
        Pending = 1 => "pending",
        Deploying = 2 => "deploying",
        Success = 3 => "success",
        Failed = 4 => "failed",
    }
}

define_status_enum! {
    /// Ledger entry kind.
    TransactionKind {
        Usage = 1 => "usage",
        Purchase = 2 => "purchase",
        Subscription = 3 => "subscription",
        Refund = 4 => "refund",
    }
}

impl TransactionKind {
    /// Parse a `?kind=` query value.
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Usage, Self::Purchase, Self::Subscription, Self::Refund]
            .into_iter()
            .find(|kind| kind.name() == name)
    }
}
