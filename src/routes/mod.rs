mod health_check;
mod home;
mod send_news;
mod subscriptions;

pub use health_check::*;
pub use home::*;
pub use send_news::*;
pub use subscriptions::*;

use serde::{Deserialize, Serialize};

/// Body shared by the JSON endpoints.
#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse {
    pub success: bool,
    pub msg: String,
}

impl ApiResponse {
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            msg: msg.into(),
        }
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            msg: msg.into(),
        }
    }
}
