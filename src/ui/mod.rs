mod spinner;
pub(crate) mod user_messages;

pub(crate) use spinner::with_spinner_future;
