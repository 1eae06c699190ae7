pub mod mock;
pub mod postmark;

pub use mock::CapturingEmailSender;
pub use postmark::PostmarkEmailSender;
