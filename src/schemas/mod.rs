pub(crate) mod paper;
pub(crate) mod question;
