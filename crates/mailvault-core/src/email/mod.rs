//! Email records: model, assembly, storage.

mod builder;
mod model;
mod repository;

pub use builder::EmailRecordBuilder;
pub use model::{Attachment, EmailId, EmailRecord, NewEmail, RecipientLink};
pub use repository::EmailRepository;

pub(crate) use repository::email_from_row;
