//! Launch signal detection for the hybrid trading core.
//!
//! Records the price range inside a fixed daily session window and, once the
//! window has closed, looks for needle rejections of the session high or low.
//!
//! ```text
//! cycle → LaunchSignalDetector.track(now, price)      session state machine
//!       → LaunchSignalDetector.scan(input)            only when trading is allowed
//!          ├─ find_rejection: proximity + move + wick/body
//!          ├─ confidence: bias, volatility band, volume surge
//!          └─ validate: confidence, size, volatility threshold
//! ```

pub mod config;
pub mod detector;
pub mod error;
pub mod needle;
pub mod session;
pub mod signal;

pub use config::LaunchConfig;
pub use detector::{LaunchDecision, LaunchSignalDetector, ScanInput};
pub use error::{DetectorError, DetectorResult};
pub use needle::{confidence, wick_body_ratio};
pub use session::{LaunchSession, SessionPhase, SessionTracker, SessionTransition};
pub use signal::{LaunchSignal, RejectReason};
