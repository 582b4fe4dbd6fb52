//! A person referenced by an entry (author or entry maker).

use std::str::FromStr;

use crate::error::{ElogError, Result};
use crate::wire::xml::{self, Element, XmlWriter};

/// Longest username the server accepts.
pub const MAX_USERNAME_LEN: usize = 60;

/// Longest first or last name the server accepts.
pub const MAX_NAME_LEN: usize = 255;

/// The optional fields that may be supplied through an attribute map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Firstname,
    Lastname,
}

impl FromStr for UserField {
    type Err = ElogError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "firstname" => Ok(Self::Firstname),
            "lastname" => Ok(Self::Lastname),
            other => Err(ElogError::Validation(format!(
                "Invalid user attribute '{other}'"
            ))),
        }
    }
}

/// A logbook user: a username plus optional first and last name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    username: String,
    firstname: String,
    lastname: String,
}

impl User {
    /// Create a user with only a username.
    pub fn new(username: impl Into<String>) -> Result<Self> {
        let mut user = Self {
            username: String::new(),
            firstname: String::new(),
            lastname: String::new(),
        };
        user.set_username(username)?;
        Ok(user)
    }

    /// Create a user and apply an attribute map.
    ///
    /// Keys must be `firstname` or `lastname`. A `username` key is ignored
    /// so the map cannot replace the explicit username.
    pub fn with_attributes<I, K, V>(username: impl Into<String>, attributes: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut user = Self::new(username)?;
        for (key, value) in attributes {
            let key = key.as_ref();
            if key == "username" {
                continue;
            }
            user.set(key.parse()?, value)?;
        }
        Ok(user)
    }

    /// The user owning this process, or `unknown` if it cannot be determined.
    pub fn process_owner() -> Self {
        let name = ["USER", "USERNAME", "LOGNAME"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty());
        name.and_then(|n| Self::new(n).ok())
            .unwrap_or_else(|| Self {
                username: "unknown".to_string(),
                firstname: String::new(),
                lastname: String::new(),
            })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn firstname(&self) -> &str {
        &self.firstname
    }

    pub fn lastname(&self) -> &str {
        &self.lastname
    }

    pub fn set_username(&mut self, username: impl Into<String>) -> Result<()> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(ElogError::Validation("Username must not be blank".into()));
        }
        check_len("Username", &username, MAX_USERNAME_LEN)?;
        self.username = username;
        Ok(())
    }

    pub fn set_firstname(&mut self, firstname: impl Into<String>) -> Result<()> {
        let firstname = firstname.into();
        check_len("First name", &firstname, MAX_NAME_LEN)?;
        self.firstname = firstname;
        Ok(())
    }

    pub fn set_lastname(&mut self, lastname: impl Into<String>) -> Result<()> {
        let lastname = lastname.into();
        check_len("Last name", &lastname, MAX_NAME_LEN)?;
        self.lastname = lastname;
        Ok(())
    }

    /// Set one of the enumerated optional fields.
    pub fn set(&mut self, field: UserField, value: impl Into<String>) -> Result<()> {
        match field {
            UserField::Firstname => self.set_firstname(value),
            UserField::Lastname => self.set_lastname(value),
        }
    }

    /// Write `<name><username/>[<firstname/>][<lastname/>]</name>`.
    pub fn write_xml(&self, w: &mut XmlWriter, name: &str) -> Result<()> {
        xml::start(w, name, &[])?;
        xml::text_element(w, "username", &[], &self.username)?;
        if !self.firstname.is_empty() {
            xml::text_element(w, "firstname", &[], &self.firstname)?;
        }
        if !self.lastname.is_empty() {
            xml::text_element(w, "lastname", &[], &self.lastname)?;
        }
        xml::end(w, name)
    }

    /// Encode as a standalone fragment under `name`.
    pub fn to_xml(&self, name: &str) -> Result<String> {
        let mut w = xml::new_writer();
        self.write_xml(&mut w, name)?;
        xml::into_string(w)
    }

    /// Rebuild a user from its XML element.
    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let username = element.child_text("username").ok_or_else(|| {
            ElogError::Xml(format!("'{}' has no username", element.name))
        })?;
        let mut user = Self::new(username.trim())?;
        if let Some(first) = element.child_text("firstname") {
            user.set_firstname(first)?;
        }
        if let Some(last) = element.child_text("lastname") {
            user.set_lastname(last)?;
        }
        Ok(user)
    }
}

fn check_len(what: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(ElogError::Validation(format!(
            "{what} exceeds limit of {max} characters"
        )));
    }
    Ok(())
}
