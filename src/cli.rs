//! Command line overrides for the `sms-smoke` binary.
//!
//! Every flag defaults to the literal request the smoke test was written for,
//! so running without arguments sends exactly that request.

use clap::Parser;
use sms_smoke::{DEFAULT_PHONE, DEFAULT_SCENE, DEFAULT_URL, SmokeConfig, SmsScene};

/// Command line arguments for the `sms-smoke` binary.
#[derive(Debug, Parser)]
#[command(name = "sms-smoke", version, about = "Send one SMS code request and print the reply")]
pub struct Cli {
    /// Endpoint receiving the JSON POST.
    #[arg(long, default_value = DEFAULT_URL)]
    pub url: String,

    /// Phone number placed in the payload. Not validated.
    #[arg(long, default_value = DEFAULT_PHONE)]
    pub phone: String,

    /// Scene tag placed in the payload.
    #[arg(long, value_enum, default_value_t = DEFAULT_SCENE)]
    pub scene: SmsScene,
}

impl From<Cli> for SmokeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            url: cli.url,
            phone: cli.phone,
            scene: cli.scene,
        }
    }
}
