//! External service integrations.

pub mod token_provider {
    pub use crate::token_provider::*;
}

pub mod crm_client {
    pub use crate::crm_client::*;
}

pub mod notifier {
    pub use crate::notifier::*;
}
