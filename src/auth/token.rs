use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use super::{AuthError, Claims, CredentialStore, Principal};

/// Issues HS256 session tokens and verifies them against the credential store
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry_hours: u64,
    store: Arc<dyn CredentialStore>,
}

impl TokenService {
    pub fn new(secret: &str, expiry_hours: u64, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            expiry_hours,
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = i64::try_from(self.expiry_hours)
            .ok()
            .and_then(Duration::try_hours)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| AuthError::Signing("Token expiry is out of range".to_string()))?;
        self.sign(&Claims {
            user_id: principal.user_id,
            username: principal.username.clone(),
            role: principal.role,
            branch_id: principal.branch_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        })
    }

    pub(crate) fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::default(), claims, &self.encoding).map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Checks signature and expiry, then reloads the user so role or branch
    /// changes made after issuance take effect immediately.
    pub async fn verify(&self, token: &str) -> Result<Principal, AuthError> {
        let claims = self.decode(token)?;

        match self.store.find_by_id(claims.user_id).await? {
            Some(principal) => Ok(principal),
            None => {
                tracing::warn!("Token subject {} ({}) no longer exists", claims.user_id, claims.username);
                Err(AuthError::UnknownSubject)
            }
        }
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
                ErrorKind::InvalidToken
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_)
                | ErrorKind::MissingRequiredClaim(_) => AuthError::Malformed,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accountant, admin, MemoryStore};

    fn service(store: MemoryStore) -> TokenService {
        TokenService::new("unit-test-secret", 1, Arc::new(store))
    }

    #[tokio::test]
    async fn round_trips_identity() {
        let principal = accountant(7, 2);
        let tokens = service(MemoryStore::with(vec![principal.clone()]));
        let token = tokens.issue(&principal).unwrap();
        assert_eq!(tokens.verify(&token).await.unwrap(), principal);
    }

    #[tokio::test]
    async fn returns_fresh_identity_not_token_copy() {
        let issued = accountant(7, 2);
        let store = MemoryStore::with(vec![issued.clone()]);
        let tokens = service(store.clone());
        let token = tokens.issue(&issued).unwrap();

        // Moved to another branch after the token was issued
        store.insert(accountant(7, 5));
        let fresh = tokens.verify(&token).await.unwrap();
        assert_eq!(fresh.branch_id, Some(5));
    }

    #[tokio::test]
    async fn deleted_user_is_unknown_subject() {
        let principal = admin(1);
        let tokens = service(MemoryStore::default());
        let token = tokens.issue(&principal).unwrap();
        assert!(matches!(tokens.verify(&token).await, Err(AuthError::UnknownSubject)));
    }

    #[tokio::test]
    async fn classifies_failures() {
        let principal = admin(1);
        let tokens = service(MemoryStore::with(vec![principal.clone()]));

        let expired = tokens
            .sign(&Claims {
                user_id: 1,
                username: principal.username.clone(),
                role: principal.role,
                branch_id: None,
                exp: Utc::now().timestamp() - 3600,
                iat: Utc::now().timestamp() - 7200,
            })
            .unwrap();
        assert!(matches!(tokens.verify(&expired).await, Err(AuthError::ExpiredToken)));

        let other = TokenService::new("another-secret", 1, Arc::new(MemoryStore::default()));
        let forged = other.issue(&principal).unwrap();
        assert!(matches!(tokens.verify(&forged).await, Err(AuthError::InvalidToken)));

        assert!(matches!(tokens.verify("not-a-jwt").await, Err(AuthError::Malformed)));
        assert!(matches!(tokens.verify("aaa.bbb.ccc").await, Err(AuthError::Malformed)));
    }

    #[test]
    fn oversized_expiry_is_an_error() {
        let principal = admin(1);
        let tokens = TokenService::new("unit-test-secret", u64::MAX, Arc::new(MemoryStore::default()));
        assert!(matches!(tokens.issue(&principal), Err(AuthError::Signing(_))));
    }
}
