use std::fmt::Display;

use mongodb::bson::Bson;
use serde_repr::{Deserialize_repr, Serialize_repr};

/// A kind of logged-in user, identified by the rights its token carries.
pub trait User {
    const RIGHTS: Rights;
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize_repr, Deserialize_repr)]
#[repr(u8)]
pub enum Rights {
    Student = 0,
    Admin = 1,
}

impl Display for Rights {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{}",
            match self {
                Self::Student => "student",
                Self::Admin => "admin",
            }
        )
    }
}

impl From<Rights> for Bson {
    fn from(rights: Rights) -> Self {
        Bson::Int32(rights as i32)
    }
}

/// A student: may register partylists, apply for candidacy and vote.
#[derive(Debug, Clone, Copy)]
pub struct Student;

impl User for Student {
    const RIGHTS: Rights = Rights::Student;
}

/// An election administrator: moderates applications and reads results.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl User for Admin {
    const RIGHTS: Rights = Rights::Admin;
}
