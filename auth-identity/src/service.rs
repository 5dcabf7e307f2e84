use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use database_layer::{Collection, DocumentStore, Filter, FindOptions};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{config::*, error::*, models::*, tokens::*};

pub struct IdentityService {
    users: Collection<User>,
    tokens: TokenService,
    config: IdentityConfig,
    argon2: Argon2<'static>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn DocumentStore>, config: IdentityConfig) -> Self {
        Self {
            users: Collection::new(store),
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl_hours),
            config,
            argon2: Argon2::default(),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Self-registration, which is open to patients only
    pub async fn register(&self, request: NewUser) -> Result<User> {
        let role = request.profile.role();
        if role != Role::Patient {
            return Err(IdentityError::RoleNotPermitted(role));
        }
        self.create_user(request).await
    }

    /// Create an account of any role
    pub async fn create_user(&self, request: NewUser) -> Result<User> {
        let email = normalize_email(&request.email);
        if !is_valid_email(&email) {
            return Err(IdentityError::InvalidEmail);
        }
        if request.name.trim().is_empty() {
            return Err(IdentityError::validation("name", "name is required"));
        }
        self.validate_password(&request.password)?;
        request.profile.validate()?;

        self.ensure_email_free(&email, None).await?;
        if let Some(ref username) = request.username {
            self.ensure_username_free(username, None).await?;
        }
        self.ensure_profile_keys_free(&request.profile, None).await?;

        let password_hash = self.hash_password(&request.password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            username: request.username,
            password_hash,
            phone: request.phone,
            date_of_birth: request.date_of_birth,
            address: request.address,
            is_active: true,
            created_at: now,
            updated_at: now,
            last_login: None,
            profile: request.profile,
        };

        self.users.insert(&user).await?;
        info!(user_id = %user.id, role = %user.role(), "User account created");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse> {
        let email = normalize_email(email);
        let mut user = self
            .users
            .find_one(&Filter::new().eq("email", &email))
            .await?
            .ok_or(IdentityError::InvalidCredentials)?;

        if !user.is_active {
            warn!(user_id = %user.id, "Login attempt on disabled account");
            return Err(IdentityError::AccountDisabled);
        }

        if let Err(e) = self.verify_password(password, &user.password_hash) {
            warn!(email = %logger_redacted::redact(&email), "Failed login attempt");
            return Err(e);
        }

        user.last_login = Some(Utc::now());
        self.users.replace(&user).await?;

        let issued = self.tokens.issue(&user)?;
        info!(user_id = %user.id, role = %user.role(), "User logged in");

        Ok(LoginResponse {
            user: user.into(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Resolve a token to a live, active user
    pub async fn verify_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.decode(token)?;
        let user = self
            .users
            .get(&claims.user_id()?.to_string())
            .await?
            .ok_or(IdentityError::InvalidToken)?;

        if !user.is_active {
            return Err(IdentityError::AccountDisabled);
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get(&id.to_string())
            .await?
            .ok_or(IdentityError::UserNotFound)
    }

    /// Active user with the given role, if any
    pub async fn find_active_with_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        Ok(self
            .users
            .get(&id.to_string())
            .await?
            .filter(|user| user.is_active && user.role() == role))
    }

    pub async fn list_users(
        &self,
        query: &UserQuery,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<User>, u64)> {
        let filter = Filter::new()
            .eq_opt("role", query.role)
            .eq_opt("isActive", query.is_active)
            .eq_opt("specialization", query.specialization);

        let total = self.users.count(&filter).await?;
        let users = self
            .users
            .find(&filter, &FindOptions::new().sort_asc("name").page(page, page_size))
            .await?;
        Ok((users, total))
    }

    /// Active, available professionals for the booking directory
    pub async fn list_doctors(&self, specialization: Option<Specialization>) -> Result<Vec<User>> {
        let filter = Filter::new()
            .eq("role", Role::HealthcareProfessional)
            .eq("isActive", true)
            .eq("isAvailable", true)
            .eq_opt("specialization", specialization);

        Ok(self
            .users
            .find(&filter, &FindOptions::new().sort_asc("name"))
            .await?)
    }

    pub async fn update_user(&self, id: Uuid, update: UpdateUser) -> Result<User> {
        let mut user = self.get_user(id).await?;

        if update.role.is_some_and(|role| role != user.role()) {
            return Err(IdentityError::RoleImmutable);
        }

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(IdentityError::validation("name", "name is required"));
            }
            user.name = name.trim().to_string();
        }
        if let Some(email) = update.email {
            let email = normalize_email(&email);
            if !is_valid_email(&email) {
                return Err(IdentityError::InvalidEmail);
            }
            self.ensure_email_free(&email, Some(user.id)).await?;
            user.email = email;
        }
        if let Some(username) = update.username {
            self.ensure_username_free(&username, Some(user.id)).await?;
            user.username = Some(username);
        }
        if update.phone.is_some() {
            user.phone = update.phone;
        }
        if update.date_of_birth.is_some() {
            user.date_of_birth = update.date_of_birth;
        }
        if update.address.is_some() {
            user.address = update.address;
        }

        if let Some(patch) = update.profile {
            let profile = merge_profile(&user.profile, patch)?;
            profile.validate()?;
            self.ensure_profile_keys_free(&profile, Some(user.id)).await?;
            user.profile = profile;
        }

        user.updated_at = Utc::now();
        self.users.replace(&user).await?;
        info!(user_id = %user.id, "User updated");
        Ok(user)
    }

    pub async fn set_active(&self, id: Uuid, active: bool) -> Result<User> {
        let mut user = self.get_user(id).await?;
        user.is_active = active;
        user.updated_at = Utc::now();
        self.users.replace(&user).await?;
        info!(user_id = %user.id, active, "User status changed");
        Ok(user)
    }

    pub async fn delete_user(&self, acting_user: Uuid, id: Uuid) -> Result<()> {
        if acting_user == id {
            return Err(IdentityError::CannotDeleteSelf);
        }
        if !self.users.delete(&id.to_string()).await? {
            return Err(IdentityError::UserNotFound);
        }
        info!(user_id = %id, deleted_by = %acting_user, "User deleted");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let mut user = self.get_user(user_id).await?;
        self.verify_password(current_password, &user.password_hash)?;
        self.validate_password(new_password)?;

        user.password_hash = self.hash_password(new_password)?;
        user.updated_at = Utc::now();
        self.users.replace(&user).await?;
        Ok(())
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<()> {
        let existing = self.users.find_one(&Filter::new().eq("email", email)).await?;
        match existing {
            Some(user) if Some(user.id) != owner => Err(IdentityError::EmailAlreadyInUse),
            _ => Ok(()),
        }
    }

    async fn ensure_username_free(&self, username: &str, owner: Option<Uuid>) -> Result<()> {
        let existing = self
            .users
            .find_one(&Filter::new().eq("username", username))
            .await?;
        match existing {
            Some(user) if Some(user.id) != owner => Err(IdentityError::UsernameAlreadyInUse),
            _ => Ok(()),
        }
    }

    async fn ensure_profile_keys_free(&self, profile: &RoleProfile, owner: Option<Uuid>) -> Result<()> {
        let (field, value, error) = match profile {
            RoleProfile::HealthcareProfessional(p) => (
                "licenseNumber",
                &p.license_number,
                IdentityError::LicenseNumberInUse,
            ),
            RoleProfile::HospitalStaff(s) => {
                ("employeeId", &s.employee_id, IdentityError::EmployeeIdInUse)
            }
            _ => return Ok(()),
        };

        let filter = Filter::new().eq("role", profile.role()).eq(field, value);
        match self.users.find_one(&filter).await? {
            Some(user) if Some(user.id) != owner => Err(error),
            _ => Ok(()),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| IdentityError::HashingError)?
            .to_string();
        Ok(password_hash)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| IdentityError::HashingError)?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| IdentityError::InvalidCredentials)
    }

    fn validate_password(&self, password: &str) -> Result<()> {
        if password.chars().count() < self.config.password_min_length {
            return Err(IdentityError::WeakPassword(format!(
                "must be at least {} characters",
                self.config.password_min_length
            )));
        }

        if self.config.password_require_uppercase && !password.chars().any(char::is_uppercase) {
            return Err(IdentityError::WeakPassword(
                "must contain an uppercase letter".into(),
            ));
        }

        if self.config.password_require_numbers && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(IdentityError::WeakPassword("must contain a number".into()));
        }

        if self.config.password_require_special_chars
            && !password.chars().any(|c| !c.is_alphanumeric())
        {
            return Err(IdentityError::WeakPassword(
                "must contain a special character".into(),
            ));
        }

        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// Overlay `patch` onto the stored role payload, keeping the role tag
fn merge_profile(
    current: &RoleProfile,
    patch: serde_json::Map<String, serde_json::Value>,
) -> Result<RoleProfile> {
    let role = current.role();
    if let Some(tag) = patch.get("role") {
        if tag.as_str() != Some(role.as_str()) {
            return Err(IdentityError::RoleImmutable);
        }
    }

    let mut value =
        serde_json::to_value(current).map_err(|e| IdentityError::validation("profile", e.to_string()))?;
    if let Some(object) = value.as_object_mut() {
        object.extend(patch.into_iter().filter(|(key, _)| key != "role"));
    }
    serde_json::from_value(value).map_err(|e| IdentityError::validation("profile", e.to_string()))
}
