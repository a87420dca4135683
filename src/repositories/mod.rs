pub(crate) mod college_details;
pub(crate) mod papers;
pub(crate) mod questions;
pub(crate) mod subjects;
pub(crate) mod unused_reports;
pub(crate) mod users;
