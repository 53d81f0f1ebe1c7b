//! Request body for the SMS-send endpoint and the literal defaults the smoke
//! test sends when nothing is overridden.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_URL: &str = "http://localhost:8080/api/auth/sms/send";
pub const DEFAULT_PHONE: &str = "13800138000";
pub const DEFAULT_SCENE: SmsScene = SmsScene::LoginRegister;

/// Purpose tag for the verification code. Only the server gives it meaning.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SmsScene {
    #[default]
    LoginRegister,
    ResetPassword,
    BindPhone,
    VerifyPhone,
    ChangePhone,
}

impl SmsScene {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginRegister => "LOGIN_REGISTER",
            Self::ResetPassword => "RESET_PASSWORD",
            Self::BindPhone => "BIND_PHONE",
            Self::VerifyPhone => "VERIFY_PHONE",
            Self::ChangePhone => "CHANGE_PHONE",
        }
    }
}

impl fmt::Display for SmsScene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsSendRequest {
    pub phone: String,
    pub scene: SmsScene,
}

impl SmsSendRequest {
    pub fn new(phone: impl Into<String>, scene: SmsScene) -> Self {
        Self {
            phone: phone.into(),
            scene,
        }
    }
}

impl Default for SmsSendRequest {
    fn default() -> Self {
        Self::new(DEFAULT_PHONE, DEFAULT_SCENE)
    }
}
