//! Credit pricing defaults and ledger entry descriptions.
//!
//! The live prices are read from the environment by the API config; these
//! constants are the fallbacks used when a variable is unset.

/// Credits granted to every new account.
pub const DEFAULT_FREE_CREDITS: i32 = 100;

/// Cost of one AI call (project creation, regeneration, idea, code, image analysis).
pub const DEFAULT_COST_AI_CALL: i32 = 2;

/// Cost of one component edit.
pub const DEFAULT_COST_EDIT_COMPONENT: i32 = 5;

/// Cost of one deployment.
pub const DEFAULT_COST_DEPLOY: i32 = 10;

pub const DESC_SIGNUP_GRANT: &str = "Welcome credits";
pub const DESC_PROJECT_CREATE: &str = "Project creation";
pub const DESC_PROJECT_GENERATE: &str = "Code generation";
pub const DESC_PROJECT_DEPLOY: &str = "Deployment";
pub const DESC_GENERATE_IDEA: &str = "App idea generation";
pub const DESC_GENERATE_CODE: &str = "Code snippet generation";
pub const DESC_EDIT_COMPONENT: &str = "Component edit";
pub const DESC_ANALYZE_IMAGE: &str = "Image analysis";

/// Effective prices, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditCosts {
    pub free_credits: i32,
    pub ai_call: i32,
    pub edit_component: i32,
    pub deploy: i32,
}

impl Default for CreditCosts {
    fn default() -> Self {
        Self {
            free_credits: DEFAULT_FREE_CREDITS,
            ai_call: DEFAULT_COST_AI_CALL,
            edit_component: DEFAULT_COST_EDIT_COMPONENT,
            deploy: DEFAULT_COST_DEPLOY,
        }
    }
}
