// src/report/mod.rs
pub mod mailer;
pub mod render;

pub use mailer::{
    MailTransport, ReportError, ReportMessage, ReportSender, SmtpMailer, SmtpSettings,
};
pub use render::{RenderedReport, ReportRenderer};
