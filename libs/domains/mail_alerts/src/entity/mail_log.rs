use crate::models::{MailAttempt, MailOutcome, NewMailAttempt};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Sea-ORM Entity for the mail_log table
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mail_log")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(column_type = "Text")]
    pub to_email: String,
    #[sea_orm(column_type = "Text")]
    pub subject: String,
    pub status: MailOutcome,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_message: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MailAttempt {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            recipients: model.to_email,
            subject: model.subject,
            outcome: model.status,
            error_detail: model.error_message,
            recorded_at: model.created_at.into(),
        }
    }
}

// id and created_at are left to the database defaults
impl From<NewMailAttempt> for ActiveModel {
    fn from(input: NewMailAttempt) -> Self {
        ActiveModel {
            id: NotSet,
            to_email: Set(input.recipients),
            subject: Set(input.subject),
            status: Set(input.outcome),
            error_message: Set(input.error_detail),
            created_at: NotSet,
        }
    }
}
