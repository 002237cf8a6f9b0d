//! # Platform Storage
//!
//! Users, courses, enrollments, and stored credential rows. The [`Storage`]
//! trait is the seam between the API layer and whatever holds the data; the
//! only implementation today is the in-memory [`memory::MemStorage`], which
//! is also what the test suite runs against.

pub mod memory;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemStorage;

/// Errors surfaced by storage writes.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Usernames are unique across the platform.
    #[error("username already taken: {0}")]
    DuplicateUsername(String),

    /// A row referenced another row that does not exist.
    #[error("{entity} not found: {id}")]
    MissingReference {
        /// Kind of the missing row.
        entity: &'static str,
        /// Identifier that failed to resolve.
        id: u64,
    },
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A platform user. Most users are created implicitly the first time a
/// wallet address shows up in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Row identifier.
    pub id: u64,
    /// Unique username.
    pub username: String,
    /// Stored as-is. Never serialized into API responses; see
    /// [`User::public_view`].
    #[serde(skip_serializing)]
    pub password: String,
    /// Ledger wallet address, if the user has linked one.
    pub wallet_address: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

/// A user row with the password stripped, safe to serialize into responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    /// Row identifier.
    pub id: u64,
    /// Unique username.
    pub username: String,
    /// Ledger wallet address, if linked.
    pub wallet_address: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Display name.
    pub name: Option<String>,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// The password-free projection returned by the API.
    pub fn public_view(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            username: self.username.clone(),
            wallet_address: self.wallet_address.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
        }
    }
}

/// Fields for a new user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Unique username.
    pub username: String,
    /// Password, stored as-is.
    pub password: String,
    /// Ledger wallet address.
    #[serde(default)]
    pub wallet_address: Option<String>,
    /// Contact email.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// A course in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Row identifier.
    pub id: u64,
    /// Course title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Cover image URL.
    pub image: String,
    /// Category tag, also reused as a skill on completion credentials.
    pub category: String,
    /// Human-readable duration (e.g. "8 weeks").
    pub duration: String,
    /// Human-readable fee (e.g. "Free").
    pub fee: String,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields for a new course row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCourse {
    /// Course title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Cover image URL.
    pub image: String,
    /// Category tag.
    pub category: String,
    /// Human-readable duration.
    pub duration: String,
    /// Human-readable fee.
    pub fee: String,
}

/// A user's enrollment in a course. At most one per (user, course) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    /// Row identifier.
    pub id: u64,
    /// Enrolled user.
    pub user_id: u64,
    /// Enrolled course.
    pub course_id: u64,
    /// When the enrollment was created.
    pub enrolled_at: DateTime<Utc>,
    /// Whether the course has been completed.
    pub completed: bool,
    /// When it was completed, if it was.
    pub completed_at: Option<DateTime<Utc>>,
}

/// Fields for a new enrollment row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEnrollment {
    /// Enrolled user.
    pub user_id: u64,
    /// Enrolled course.
    pub course_id: u64,
}

/// A credential row as stored by the platform. The ledger anchoring lives in
/// `tx_hash`; everything else is the platform's own record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCredential {
    /// Row identifier.
    pub id: u64,
    /// Credential title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Owning user.
    pub user_id: u64,
    /// Course the credential certifies.
    pub course_id: u64,
    /// Issuing institution name.
    pub issuer_name: String,
    /// Hash of the anchoring ledger transaction, once anchored.
    pub tx_hash: Option<String>,
    /// When the row was created.
    pub issued_at: DateTime<Utc>,
    /// Skill tags.
    pub skills: Vec<String>,
}

/// Fields for a new credential row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCredential {
    /// Credential title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Owning user.
    pub user_id: u64,
    /// Course the credential certifies.
    pub course_id: u64,
    /// Issuing institution name.
    pub issuer_name: String,
    /// Anchoring transaction hash, if already anchored.
    #[serde(default)]
    pub tx_hash: Option<String>,
    /// Skill tags.
    #[serde(default)]
    pub skills: Vec<String>,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// CRUD surface the API layer is written against.
pub trait Storage: Send + Sync {
    /// Looks up a user by row ID.
    fn user(&self, id: u64) -> Option<User>;
    /// Looks up a user by exact username.
    fn user_by_username(&self, username: &str) -> Option<User>;
    /// Looks up a user by linked wallet address.
    fn user_by_wallet(&self, wallet_address: &str) -> Option<User>;
    /// Inserts a user. Fails on duplicate username.
    fn create_user(&self, new: NewUser) -> Result<User, StorageError>;

    /// The whole course catalog, in insertion order.
    fn all_courses(&self) -> Vec<Course>;
    /// Looks up a course by row ID.
    fn course(&self, id: u64) -> Option<Course>;
    /// Inserts a course.
    fn create_course(&self, new: NewCourse) -> Course;

    /// Looks up the enrollment for a (user, course) pair.
    fn enrollment(&self, user_id: u64, course_id: u64) -> Option<Enrollment>;
    /// All enrollments for a user.
    fn user_enrollments(&self, user_id: u64) -> Vec<Enrollment>;
    /// Inserts an enrollment. Fails when user or course is missing.
    fn create_enrollment(&self, new: NewEnrollment) -> Result<Enrollment, StorageError>;

    /// All credentials owned by a user.
    fn user_credentials(&self, user_id: u64) -> Vec<StoredCredential>;
    /// Looks up a credential by its anchoring transaction hash.
    fn credential_by_tx_hash(&self, tx_hash: &str) -> Option<StoredCredential>;
    /// Inserts a credential row.
    fn create_credential(&self, new: NewCredential) -> StoredCredential;
}
