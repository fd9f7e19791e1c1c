use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::User;
use serde_json::{Map, Value};

use crate::validation::{check_email, FieldError, Validate};

/// Scheme label returned alongside every access token.
pub const TOKEN_TYPE: &str = "bearer";

/// Request body for user registration.
#[derive(Clone, Deserialize)]
pub struct UserCreate {
    pub email: String,
    pub nickname: String,
    pub password: String,
}

impl UserCreate {
    /// Build the stored user. The plaintext password is dropped here.
    pub fn into_user(self, password_hash: String) -> User {
        User::new(self.email, self.nickname, password_hash)
    }
}

impl Validate for UserCreate {
    const REQUIRED: &'static [&'static str] = &["email", "nickname", "password"];

    fn check(fields: &Map<String, Value>, errors: &mut Vec<FieldError>) {
        check_email(fields, errors);
    }
}

/// Request body for login.
#[derive(Clone, Deserialize)]
pub struct UserLogin {
    pub email: String,
    pub password: String,
}

impl Validate for UserLogin {
    const REQUIRED: &'static [&'static str] = &["email", "password"];

    fn check(fields: &Map<String, Value>, errors: &mut Vec<FieldError>) {
        check_email(fields, errors);
    }
}

// handlers are instrumented; keep plaintext passwords out of span fields
impl std::fmt::Debug for UserCreate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCreate")
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl std::fmt::Debug for UserLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserLogin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub nickname: String,
    pub found_cards: Vec<Uuid>,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            nickname: u.nickname,
            found_cards: u.found_cards,
            is_admin: u.is_admin,
            created_at: u.created_at,
        }
    }
}

impl From<&User> for UserResponse {
    fn from(u: &User) -> Self {
        Self::from(u.clone())
    }
}

/// Grants or revokes admin rights on a target user.
#[derive(Debug, Clone, Deserialize)]
pub struct AdminUserUpdate {
    pub is_admin: bool,
}

impl Validate for AdminUserUpdate {
    const REQUIRED: &'static [&'static str] = &["is_admin"];
}

/// Response returned after login or register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

impl LoginResponse {
    pub fn bearer(access_token: String, user: impl Into<UserResponse>) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE.to_string(),
            user: user.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::parse_json;
    use std::collections::HashSet;

    fn sample_user() -> User {
        let mut user = User::new(
            "a@b.com".into(),
            "Ash".into(),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".into(),
        );
        user.found_cards = vec![Uuid::new_v4(), Uuid::new_v4()];
        user
    }

    #[test]
    fn user_create_accepts_valid_input() {
        let create: UserCreate =
            parse_json(br#"{"email":"a@b.com","nickname":"Ash","password":"pw123"}"#).unwrap();
        assert_eq!(create.email, "a@b.com");
        assert_eq!(create.password, "pw123");
    }

    #[test]
    fn user_create_rejects_bad_email() {
        let err = parse_json::<UserCreate>(
            br#"{"email":"not-an-email","nickname":"Ash","password":"pw123"}"#,
        )
        .unwrap_err();
        assert_eq!(err.fields.len(), 1);
        assert!(err.has_field("email"));
    }

    #[test]
    fn user_create_reports_missing_nickname() {
        let err =
            parse_json::<UserCreate>(br#"{"email":"a@b.com","password":"pw123"}"#).unwrap_err();
        assert!(err.has_field("nickname"));
    }

    #[test]
    fn user_create_reports_every_problem_at_once() {
        let err = parse_json::<UserCreate>(br#"{"email":"not-an-email"}"#).unwrap_err();
        assert!(err.has_field("email"), "{err}");
        assert!(err.has_field("nickname"), "{err}");
        assert!(err.has_field("password"), "{err}");
        assert_eq!(err.fields.len(), 3);
    }

    #[test]
    fn user_create_reports_wrong_types_with_missing_fields() {
        let err = parse_json::<UserCreate>(br#"{"email":42,"nickname":["Ash"]}"#).unwrap_err();
        assert!(err.has_field("email"), "{err}");
        assert!(err.has_field("nickname"), "{err}");
        assert!(err.has_field("password"), "{err}");
        assert_eq!(err.fields.len(), 3);
    }

    #[test]
    fn user_login_rejects_emails_without_domain() {
        for email in ["ash", "ash@", "ash@pallet", "@pallet.town"] {
            let body = serde_json::json!({ "email": email, "password": "pw" }).to_string();
            let err = parse_json::<UserLogin>(body.as_bytes()).unwrap_err();
            assert!(err.has_field("email"), "{email} should be rejected");
        }
    }

    #[test]
    fn into_user_generates_fresh_ids_and_hides_password() {
        let start = OffsetDateTime::now_utc();
        let mut seen = HashSet::new();
        for i in 0..50 {
            let create = UserCreate {
                email: format!("u{i}@b.com"),
                nickname: "Ash".into(),
                password: "pw123".into(),
            };
            let user = create.into_user("hashed".into());
            assert!(seen.insert(user.id));
            assert!(user.created_at >= start);
            assert_eq!(user.password_hash, "hashed");
        }
    }

    #[test]
    fn user_response_never_carries_credentials() {
        let user = sample_user();
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.keys().all(|k| !k.contains("password") && !k.contains("hash")));
        assert!(obj.values().all(|v| v.as_str() != Some(user.password_hash.as_str())));
        assert_eq!(obj["found_cards"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn login_response_wraps_redacted_user() {
        let user = sample_user();
        let resp = LoginResponse::bearer("tok".into(), &user);
        assert_eq!(resp.token_type, "bearer");
        let text = serde_json::to_string(&resp).unwrap();
        assert!(!text.contains(&user.password_hash));
        assert!(text.contains("\"nickname\":\"Ash\""));
    }

    #[test]
    fn debug_redacts_password() {
        let login = UserLogin {
            email: "a@b.com".into(),
            password: "pw123".into(),
        };
        assert!(!format!("{login:?}").contains("pw123"));
    }

    #[test]
    fn admin_update_requires_flag() {
        let err = parse_json::<AdminUserUpdate>(b"{}").unwrap_err();
        assert!(err.has_field("is_admin"));
        let err = parse_json::<AdminUserUpdate>(br#"{"is_admin":"yes"}"#).unwrap_err();
        assert!(err.has_field("is_admin"));
        assert!(parse_json::<AdminUserUpdate>(br#"{"is_admin":true}"#).unwrap().is_admin);
    }
}
