//! In-memory [`Storage`] implementation.
//!
//! Plain maps behind a single `parking_lot::RwLock`. Enrollments are keyed
//! by `(user_id, course_id)` so the one-enrollment-per-pair rule falls out
//! of the map itself. A fresh store ships with the sample course catalog.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use super::{
    Course, Enrollment, NewCourse, NewCredential, NewEnrollment, NewUser, Storage, StorageError,
    StoredCredential, User,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<u64, User>,
    courses: BTreeMap<u64, Course>,
    enrollments: BTreeMap<(u64, u64), Enrollment>,
    credentials: BTreeMap<u64, StoredCredential>,
    next_user_id: u64,
    next_course_id: u64,
    next_enrollment_id: u64,
    next_credential_id: u64,
}

/// In-memory store, seeded with the sample course catalog.
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl Default for MemStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStorage {
    /// Creates a store pre-populated with the sample courses.
    pub fn new() -> Self {
        let store = Self::empty();
        for course in sample_courses() {
            store.create_course(course);
        }
        tracing::info!(courses = store.all_courses().len(), "storage initialized");
        store
    }

    /// Creates a completely empty store. Tests that want a blank catalog
    /// start here.
    pub fn empty() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_user_id: 1,
                next_course_id: 1,
                next_enrollment_id: 1,
                next_credential_id: 1,
                ..Tables::default()
            }),
        }
    }
}

impl Storage for MemStorage {
    fn user(&self, id: u64) -> Option<User> {
        self.tables.read().users.get(&id).cloned()
    }

    fn user_by_username(&self, username: &str) -> Option<User> {
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned()
    }

    fn user_by_wallet(&self, wallet_address: &str) -> Option<User> {
        self.tables
            .read()
            .users
            .values()
            .find(|u| u.wallet_address.as_deref() == Some(wallet_address))
            .cloned()
    }

    fn create_user(&self, new: NewUser) -> Result<User, StorageError> {
        let mut tables = self.tables.write();
        if tables.users.values().any(|u| u.username == new.username) {
            return Err(StorageError::DuplicateUsername(new.username));
        }
        let id = tables.next_user_id;
        tables.next_user_id += 1;
        let user = User {
            id,
            username: new.username,
            password: new.password,
            wallet_address: new.wallet_address,
            email: new.email,
            name: new.name,
            created_at: Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    fn all_courses(&self) -> Vec<Course> {
        self.tables.read().courses.values().cloned().collect()
    }

    fn course(&self, id: u64) -> Option<Course> {
        self.tables.read().courses.get(&id).cloned()
    }

    fn create_course(&self, new: NewCourse) -> Course {
        let mut tables = self.tables.write();
        let id = tables.next_course_id;
        tables.next_course_id += 1;
        let course = Course {
            id,
            title: new.title,
            description: new.description,
            image: new.image,
            category: new.category,
            duration: new.duration,
            fee: new.fee,
            created_at: Utc::now(),
        };
        tables.courses.insert(id, course.clone());
        course
    }

    fn enrollment(&self, user_id: u64, course_id: u64) -> Option<Enrollment> {
        self.tables
            .read()
            .enrollments
            .get(&(user_id, course_id))
            .cloned()
    }

    fn user_enrollments(&self, user_id: u64) -> Vec<Enrollment> {
        self.tables
            .read()
            .enrollments
            .values()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    fn create_enrollment(&self, new: NewEnrollment) -> Result<Enrollment, StorageError> {
        let mut tables = self.tables.write();
        if !tables.users.contains_key(&new.user_id) {
            return Err(StorageError::MissingReference {
                entity: "user",
                id: new.user_id,
            });
        }
        if !tables.courses.contains_key(&new.course_id) {
            return Err(StorageError::MissingReference {
                entity: "course",
                id: new.course_id,
            });
        }
        let id = tables.next_enrollment_id;
        tables.next_enrollment_id += 1;
        let enrollment = Enrollment {
            id,
            user_id: new.user_id,
            course_id: new.course_id,
            enrolled_at: Utc::now(),
            completed: false,
            completed_at: None,
        };
        tables
            .enrollments
            .insert((new.user_id, new.course_id), enrollment.clone());
        Ok(enrollment)
    }

    fn user_credentials(&self, user_id: u64) -> Vec<StoredCredential> {
        self.tables
            .read()
            .credentials
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect()
    }

    fn credential_by_tx_hash(&self, tx_hash: &str) -> Option<StoredCredential> {
        self.tables
            .read()
            .credentials
            .values()
            .find(|c| c.tx_hash.as_deref() == Some(tx_hash))
            .cloned()
    }

    fn create_credential(&self, new: NewCredential) -> StoredCredential {
        let mut tables = self.tables.write();
        let id = tables.next_credential_id;
        tables.next_credential_id += 1;
        let credential = StoredCredential {
            id,
            title: new.title,
            description: new.description,
            user_id: new.user_id,
            course_id: new.course_id,
            issuer_name: new.issuer_name,
            tx_hash: new.tx_hash,
            issued_at: Utc::now(),
            skills: new.skills,
        };
        tables.credentials.insert(id, credential.clone());
        credential
    }
}

/// The course catalog every fresh deployment starts with.
fn sample_courses() -> Vec<NewCourse> {
    vec![
        NewCourse {
            title: "Blockchain Fundamentals".into(),
            description: "Learn the core concepts of blockchain technology, cryptography, \
                          and distributed ledger systems."
                .into(),
            image: "https://images.unsplash.com/photo-1516321318423-f06f85e504b3".into(),
            category: "Blockchain".into(),
            duration: "8 weeks".into(),
            fee: "Free".into(),
        },
        NewCourse {
            title: "Stellar Development".into(),
            description: "Master Stellar blockchain development with hands-on projects and \
                          real-world applications."
                .into(),
            image: "https://images.unsplash.com/photo-1526304640581-d334cdbbf45e".into(),
            category: "Development".into(),
            duration: "6 weeks".into(),
            fee: "Free".into(),
        },
        NewCourse {
            title: "Smart Contract Engineering".into(),
            description: "Build secure and efficient smart contracts for decentralized \
                          applications on Stellar."
                .into(),
            image: "https://images.unsplash.com/photo-1633265486064-086b219458ec".into(),
            category: "Advanced".into(),
            duration: "10 weeks".into(),
            fee: "Free".into(),
        },
    ]
}
