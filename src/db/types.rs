use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Admin,
    Lecturer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[sqlx(type_name = "assessmenttype")]
pub(crate) enum AssessmentType {
    #[serde(rename = "I Internal")]
    #[sqlx(rename = "I Internal")]
    FirstInternal,
    #[serde(rename = "II Internal")]
    #[sqlx(rename = "II Internal")]
    SecondInternal,
    #[serde(rename = "III Internal")]
    #[sqlx(rename = "III Internal")]
    ThirdInternal,
    #[serde(rename = "Final")]
    #[sqlx(rename = "Final")]
    Final,
}

impl AssessmentType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            AssessmentType::FirstInternal => "I Internal",
            AssessmentType::SecondInternal => "II Internal",
            AssessmentType::ThirdInternal => "III Internal",
            AssessmentType::Final => "Final",
        }
    }
}
