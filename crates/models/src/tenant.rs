use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tenant")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub site_name: String,
    pub use_email: bool,
    pub is_private: bool,
    pub is_restrict_domain: bool,
    /// JSON array of e-mail domains allowed to sign up
    pub allow_domains: Json,
    #[serde(rename = "useOAuth")]
    pub use_oauth: bool,
    pub oauth_config: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    User,
    #[sea_orm(has_many = "super::project::Entity")]
    Project,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::project::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Project.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Keys of `oauth_config` that only the tenant's SUPER users may read.
pub const OAUTH_SECRET_KEYS: [&str; 1] = ["clientSecret"];

impl Model {
    pub fn allow_domain_list(&self) -> Vec<String> {
        serde_json::from_value(self.allow_domains.clone()).unwrap_or_default()
    }

    /// Public view of the tenant: OAuth secrets removed.
    pub fn without_secrets(mut self) -> Self {
        if let Some(Json::Object(cfg)) = self.oauth_config.as_mut() {
            for key in OAUTH_SECRET_KEYS {
                cfg.remove(key);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tenant(oauth_config: Option<Json>) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: 1,
            site_name: "acme".into(),
            use_email: true,
            is_private: false,
            is_restrict_domain: false,
            allow_domains: json!([]),
            use_oauth: true,
            oauth_config,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_view_drops_client_secret() {
        let t = tenant(Some(json!({ "clientId": "cid", "clientSecret": "s3cret" }))).without_secrets();
        assert_eq!(t.oauth_config, Some(json!({ "clientId": "cid" })));
        assert_eq!(tenant(None).without_secrets().oauth_config, None);
    }

    #[test]
    fn oauth_flag_serializes_as_use_oauth_camel() {
        let v = serde_json::to_value(tenant(None)).unwrap();
        assert_eq!(v["useOAuth"], true);
        assert!(v.get("useOauth").is_none());
    }
}
