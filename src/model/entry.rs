//! The log entry aggregate and its canonical XML encoding.

use std::fmt::Display;
use std::path::Path;

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::error::{ElogError, Result};
use crate::wire::xml::{self, Element, XmlWriter};

use super::address;
use super::attachment::{Attachment, FileAttachment, UrlAttachment};
use super::date;
use super::user::User;

/// Longest title the server stores.
pub const MAX_TITLE_LEN: usize = 255;

/// Body formats that are sent as `html`; everything else is `text`.
const HTML_BODY_TYPES: &[&str] = &[
    "html",
    "full_html",
    "filtered_html",
    "basic_html",
    "restricted_html",
];

/// Map a stored body format to the wire value (`html` or `text`).
pub fn wire_body_type(body_type: &str) -> &'static str {
    let lower = body_type.trim().to_lowercase();
    if HTML_BODY_TYPES.contains(&lower.as_str()) {
        "html"
    } else {
        "text"
    }
}

/// Insertion-ordered values keyed by a normalized string.
#[derive(Debug, Clone)]
struct KeyedSet<V> {
    items: Vec<(String, V)>,
}

impl<V> Default for KeyedSet<V> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<V> KeyedSet<V> {
    /// Insert unless the key is already present (first value wins).
    fn insert_new(&mut self, key: String, value: V) -> bool {
        if self.items.iter().any(|(k, _)| *k == key) {
            return false;
        }
        self.items.push((key, value));
        true
    }

    /// Insert or replace the value in place (last value wins, position kept).
    fn upsert(&mut self, key: String, value: V) {
        match self.items.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.items.push((key, value)),
        }
    }

    fn get(&self, key: &str) -> Option<&V> {
        self.items.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    fn values(&self) -> impl Iterator<Item = &V> {
        self.items.iter().map(|(_, v)| v)
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn clear(&mut self) {
        self.items.clear();
    }
}

/// An electronic logbook entry.
///
/// A new entry has no lognumber; the server assigns one on acceptance.
/// Content is added cumulatively and encoded with [`Entry::to_xml`].
#[derive(Debug, Clone)]
pub struct Entry {
    lognumber: Option<u64>,
    title: String,
    created: DateTime<FixedOffset>,
    author: User,
    body: String,
    body_type: String,
    logbooks: KeyedSet<String>,
    tags: KeyedSet<String>,
    entrymakers: KeyedSet<User>,
    /// Reference type (lowercase) → distinct ids, both in insertion order.
    references: Vec<(String, Vec<String>)>,
    notifications: KeyedSet<String>,
    attachments: Vec<Attachment>,
    /// Suffix used to qualify bare usernames in notifications.
    email_domain: String,
}

impl Entry {
    /// Start a new entry with a title and one or more logbooks.
    ///
    /// The creation time is now and the author is the process owner.
    pub fn new<I, S>(title: impl Into<String>, logbooks: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entry = Self::empty();
        entry.set_title(title)?;
        entry.set_logbooks(logbooks);
        Ok(entry)
    }

    fn empty() -> Self {
        Self {
            lognumber: None,
            title: String::new(),
            created: date::now(),
            author: User::process_owner(),
            body: String::new(),
            body_type: String::new(),
            logbooks: KeyedSet::default(),
            tags: KeyedSet::default(),
            entrymakers: KeyedSet::default(),
            references: Vec::new(),
            notifications: KeyedSet::default(),
            attachments: Vec::new(),
            email_domain: String::new(),
        }
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn lognumber(&self) -> Option<u64> {
        self.lognumber
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn created(&self) -> &DateTime<FixedOffset> {
        &self.created
    }

    pub fn author(&self) -> &User {
        &self.author
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// The body format as given to [`Entry::set_body_typed`] (empty if no body).
    pub fn body_type(&self) -> &str {
        &self.body_type
    }

    pub fn logbooks(&self) -> Vec<&str> {
        self.logbooks.values().map(String::as_str).collect()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tags.values().map(String::as_str).collect()
    }

    pub fn entrymakers(&self) -> impl Iterator<Item = &User> {
        self.entrymakers.values()
    }

    pub fn entrymaker(&self, username: &str) -> Option<&User> {
        self.entrymakers.get(username)
    }

    /// `(type, ids)` pairs in insertion order.
    pub fn references(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.references
            .iter()
            .map(|(kind, ids)| (kind.as_str(), ids.as_slice()))
    }

    pub fn reference_ids(&self, kind: &str) -> Option<&[String]> {
        let kind = kind.trim().to_lowercase();
        self.references
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, ids)| ids.as_slice())
    }

    pub fn notifications(&self) -> Vec<&str> {
        self.notifications.values().map(String::as_str).collect()
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn email_domain(&self) -> &str {
        &self.email_domain
    }

    // ── Mutators ────────────────────────────────────────────────

    /// Set the title. Titles longer than 255 characters are rejected.
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ElogError::Validation(format!(
                "Title exceeds limit of {MAX_TITLE_LEN} characters"
            )));
        }
        self.title = title;
        Ok(())
    }

    /// Replace the logbook list.
    pub fn set_logbooks<I, S>(&mut self, logbooks: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.logbooks.clear();
        for book in logbooks {
            self.add_logbook(book.as_ref());
        }
    }

    /// Add a logbook. Names are case-insensitive; the first spelling is kept.
    pub fn add_logbook(&mut self, logbook: &str) {
        let name = logbook.trim();
        if name.is_empty() {
            return;
        }
        self.logbooks.insert_new(name.to_uppercase(), name.to_string());
    }

    pub fn set_created(&mut self, created: DateTime<FixedOffset>) {
        self.created = created;
    }

    /// Set the creation time from a Unix timestamp.
    pub fn set_created_epoch(&mut self, secs: i64) -> Result<()> {
        self.created = date::from_epoch(secs).ok_or_else(|| {
            ElogError::Validation(format!("Timestamp {secs} is out of range"))
        })?;
        Ok(())
    }

    /// Set the creation time from a free-form date string.
    pub fn set_created_str(&mut self, when: &str) -> Result<()> {
        self.created = date::parse_date(when)
            .ok_or_else(|| ElogError::Validation(format!("Unparsable date '{when}'")))?;
        Ok(())
    }

    /// Set the author by username.
    pub fn set_author(&mut self, username: &str) -> Result<()> {
        self.author = User::new(username)?;
        Ok(())
    }

    /// Set the author by username plus `firstname`/`lastname` attributes.
    pub fn set_author_with<I, K, V>(&mut self, username: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.author = User::with_attributes(username, attributes)?;
        Ok(())
    }

    pub fn set_author_user(&mut self, author: User) {
        self.author = author;
    }

    /// Reset the author to the user owning this process.
    pub fn default_author(&mut self) {
        self.author = User::process_owner();
    }

    /// Credit a user with making the entry. A repeated username replaces
    /// the earlier one.
    pub fn add_entry_maker(&mut self, username: &str) -> Result<()> {
        self.add_entry_maker_user(User::new(username)?);
        Ok(())
    }

    pub fn add_entry_maker_with<I, K, V>(&mut self, username: &str, attributes: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        self.add_entry_maker_user(User::with_attributes(username, attributes)?);
        Ok(())
    }

    pub fn add_entry_maker_user(&mut self, user: User) {
        self.entrymakers.upsert(user.username().to_string(), user);
    }

    /// Set the domain used to qualify bare usernames in [`Entry::add_notify`].
    pub fn set_email_domain(&mut self, domain: impl Into<String>) {
        self.email_domain = domain.into();
    }

    /// Add a notification recipient (email address or bare username).
    pub fn add_notify(&mut self, who: &str) {
        match address::qualify(who, &self.email_domain) {
            Some(addr) => {
                self.notifications.insert_new(address::address_key(&addr), addr);
            }
            None => debug!(input = who, "Ignoring blank notification address"),
        }
    }

    /// Add a reference to an external system, e.g. `("atlis", 100)`.
    ///
    /// Ignored when either part is empty or `"0"`.
    pub fn add_reference(&mut self, kind: &str, id: impl Display) {
        let kind = kind.trim().to_lowercase();
        let id = id.to_string().trim().to_string();
        if is_blank(&kind) || is_blank(&id) {
            debug!(kind = %kind, id = %id, "Ignoring empty reference");
            return;
        }
        match self.references.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, ids)) => {
                if !ids.contains(&id) {
                    ids.push(id);
                }
            }
            None => self.references.push((kind, vec![id])),
        }
    }

    /// Add a tag. Tags are case-insensitive; the first spelling is kept.
    pub fn add_tag(&mut self, tag: &str) {
        let tag = tag.trim();
        if tag.is_empty() {
            return;
        }
        self.tags.insert_new(tag.to_lowercase(), tag.to_string());
    }

    /// Set a plain-text body.
    pub fn set_body(&mut self, text: impl Into<String>) {
        self.set_body_typed(text, "text");
    }

    /// Set the body with an explicit format (`text`, `html`, `full_html`, ...).
    pub fn set_body_typed(&mut self, text: impl Into<String>, body_type: &str) {
        self.body = text.into();
        self.body_type = body_type.to_string();
    }

    /// Assign a lognumber. Zero is not a lognumber and is ignored.
    pub fn set_lognumber(&mut self, lognumber: u64) {
        if lognumber == 0 {
            debug!("Ignoring lognumber 0");
            return;
        }
        self.lognumber = Some(lognumber);
    }

    /// Assign a lognumber from text; anything non-numeric is ignored.
    pub fn set_lognumber_str(&mut self, lognumber: &str) {
        match lognumber.trim().parse::<u64>() {
            Ok(n) => self.set_lognumber(n),
            Err(_) => debug!(input = lognumber, "Ignoring non-numeric lognumber"),
        }
    }

    /// Attach a file, reading it now.
    pub fn add_attachment(
        &mut self,
        path: impl AsRef<Path>,
        caption: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<()> {
        let file = FileAttachment::from_path(path, caption, mime_type)?;
        self.attachments.push(Attachment::File(file));
        Ok(())
    }

    /// Attach a resource by URL.
    pub fn add_attachment_url(&mut self, url: &str, caption: Option<&str>, mime_type: Option<&str>) {
        self.attachments
            .push(Attachment::Url(UrlAttachment::new(url, caption, mime_type)));
    }

    pub fn push_attachment(&mut self, attachment: Attachment) {
        self.attachments.push(attachment);
    }

    // ── Encoding ────────────────────────────────────────────────

    /// Encode the canonical Logentry document.
    pub fn to_xml(&self) -> Result<String> {
        let mut w = xml::new_writer();
        xml::write_declaration(&mut w)?;
        self.write_xml(&mut w)?;
        xml::into_string(w)
    }

    /// Write the `<Logentry>` element. Element order is fixed by the schema;
    /// attachments go last so the inline payloads do not bury the rest.
    pub fn write_xml(&self, w: &mut XmlWriter) -> Result<()> {
        xml::start(w, "Logentry", &[])?;

        if let Some(n) = self.lognumber {
            xml::text_element(w, "lognumber", &[], &n.to_string())?;
        }
        xml::text_element(w, "created", &[], &date::format_created(&self.created))?;
        xml::text_element(w, "title", &[], &self.title)?;
        self.author.write_xml(w, "Author")?;

        write_list(w, "Logbooks", self.logbooks.values(), |w, book| {
            xml::text_element(w, "logbook", &[], book)
        })?;
        write_list(w, "Tags", self.tags.values(), |w, tag| {
            xml::text_element(w, "tag", &[], tag)
        })?;
        write_list(w, "Entrymakers", self.entrymakers.values(), |w, user| {
            user.write_xml(w, "Entrymaker")
        })?;

        if !self.body.is_empty() {
            xml::cdata_element(
                w,
                "body",
                &[("type", wire_body_type(&self.body_type))],
                &self.body,
            )?;
        }

        if !self.notifications.is_empty() {
            write_list(w, "Notifications", self.notifications.values(), |w, addr| {
                xml::text_element(w, "email", &[], addr)
            })?;
        }

        if !self.references.is_empty() {
            xml::start(w, "References", &[])?;
            for (kind, ids) in &self.references {
                for id in ids {
                    xml::text_element(w, "reference", &[("type", kind.as_str())], id)?;
                }
            }
            xml::end(w, "References")?;
        }

        if !self.attachments.is_empty() {
            xml::start(w, "Attachments", &[])?;
            for attachment in &self.attachments {
                attachment.write_xml(w, "Attachment")?;
            }
            xml::end(w, "Attachments")?;
        }

        xml::end(w, "Logentry")
    }

    /// Write the XML to a file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let xml = self.to_xml()?;
        std::fs::write(path, xml).map_err(|e| ElogError::io(path, e))
    }

    // ── Decoding ────────────────────────────────────────────────

    /// Rebuild an entry from a Logentry document (a queued file or a copy
    /// fetched from the server). Unknown elements are ignored.
    pub fn from_xml(text: &str) -> Result<Self> {
        let root = xml::parse_document(text)?;
        if root.name != "Logentry" {
            return Err(ElogError::Xml(format!(
                "expected root element 'Logentry', found '{}'",
                root.name
            )));
        }
        Self::from_element(&root)
    }

    /// Read and decode a Logentry file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ElogError::io(path, e))?;
        Self::from_xml(&text)
    }

    fn from_element(root: &Element) -> Result<Self> {
        let mut entry = Self::empty();

        if let Some(n) = root.child_text("lognumber") {
            entry.set_lognumber_str(n);
        }
        if let Some(created) = root.child_text("created") {
            entry.created = DateTime::parse_from_rfc3339(created.trim())
                .map_err(|e| ElogError::Xml(format!("bad created '{created}': {e}")))?;
        }
        entry.set_title(root.child_text("title").unwrap_or(""))?;
        if let Some(author) = root.child("Author") {
            entry.author = User::from_element(author)?;
        }

        for book in children_of(root, "Logbooks", "logbook") {
            entry.add_logbook(&book.text);
        }
        for tag in children_of(root, "Tags", "tag") {
            entry.add_tag(&tag.text);
        }
        for maker in children_of(root, "Entrymakers", "Entrymaker") {
            entry.add_entry_maker_user(User::from_element(maker)?);
        }

        if let Some(body) = root.child("body") {
            entry.set_body_typed(body.text.clone(), body.attribute("type").unwrap_or("text"));
        }

        for email in children_of(root, "Notifications", "email") {
            entry.add_notify(&email.text);
        }
        for reference in children_of(root, "References", "reference") {
            entry.add_reference(reference.attribute("type").unwrap_or(""), &reference.text);
        }
        for attachment in children_of(root, "Attachments", "Attachment") {
            entry.attachments.push(Attachment::from_element(attachment)?);
        }

        Ok(entry)
    }
}

/// Write `<container>` with one child per item, or `<container/>` if empty.
fn write_list<'a, T: 'a>(
    w: &mut XmlWriter,
    container: &str,
    items: impl Iterator<Item = &'a T>,
    mut write_item: impl FnMut(&mut XmlWriter, &'a T) -> Result<()>,
) -> Result<()> {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return xml::empty(w, container);
    }
    xml::start(w, container, &[])?;
    for item in items {
        write_item(w, item)?;
    }
    xml::end(w, container)
}

fn children_of<'a>(
    root: &'a Element,
    container: &'a str,
    child: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    root.child(container)
        .into_iter()
        .flat_map(move |c| c.children_named(child))
}

/// Empty or `"0"`, which callers use to mean "no value".
fn is_blank(value: &str) -> bool {
    value.is_empty() || value == "0"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> Entry {
        Entry::new("test", ["TLOG"]).unwrap()
    }

    #[test]
    fn test_new_entry() {
        let e = entry();
        assert_eq!(e.title(), "test");
        assert_eq!(e.logbooks(), vec!["TLOG"]);
        assert_eq!(e.lognumber(), None);
        assert_eq!(e.author().username(), User::process_owner().username());
    }

    #[test]
    fn test_title_limit() {
        assert!(Entry::new("x".repeat(255), ["TLOG"]).is_ok());
        let mut e = entry();
        assert!(matches!(
            e.set_title("x".repeat(256)),
            Err(ElogError::Validation(_))
        ));
        assert_eq!(e.title(), "test");
    }

    #[test]
    fn test_logbooks_case_insensitive_first_spelling_kept() {
        let mut e = entry();
        e.add_logbook("elog");
        e.add_logbook("ELOG");
        e.add_logbook("tlog");
        assert_eq!(e.logbooks(), vec!["TLOG", "elog"]);

        e.set_logbooks(["ELOG", "SLOG"]);
        assert_eq!(e.logbooks(), vec!["ELOG", "SLOG"]);
    }

    #[test]
    fn test_tags() {
        let mut e = entry();
        e.add_tag("Readme");
        e.add_tag("Autolog");
        e.add_tag("readme");
        assert_eq!(e.tags(), vec!["Readme", "Autolog"]);
    }

    #[test]
    fn test_blank_entrymaker_and_author_rejected() {
        let mut e = entry();
        assert!(matches!(e.add_entry_maker(""), Err(ElogError::Validation(_))));
        assert!(e.set_author("  ").is_err());
        assert_eq!(e.entrymakers().count(), 0);
        assert!(!e.author().username().is_empty());
    }

    #[test]
    fn test_entrymakers_last_write_wins() {
        let mut e = entry();
        e.add_entry_maker("bob").unwrap();
        e.add_entry_maker("sally").unwrap();
        e.add_entry_maker_with("bob", [("firstname", "Bob"), ("lastname", "Smith")])
            .unwrap();
        let names: Vec<&str> = e.entrymakers().map(User::username).collect();
        assert_eq!(names, vec!["bob", "sally"]);
        assert_eq!(e.entrymaker("bob").unwrap().lastname(), "Smith");
    }

    #[test]
    fn test_references() {
        let mut e = entry();
        e.add_reference("atlis", 100);
        e.add_reference("ATLIS", 100);
        assert_eq!(e.reference_ids("atlis").unwrap(), ["100"]);
        e.add_reference("atlis", 101);
        assert_eq!(e.reference_ids("atlis").unwrap(), ["100", "101"]);
        e.add_reference("", 5);
        e.add_reference("elog", "");
        e.add_reference("elog", 0);
        assert_eq!(e.references().count(), 1);
    }

    #[test]
    fn test_notifications() {
        let mut e = entry();
        e.set_email_domain("@example.com");
        e.add_notify("bob");
        assert_eq!(e.notifications(), vec!["bob@example.com"]);
        e.add_notify("BOB@example.com");
        assert_eq!(e.notifications().len(), 1);
        e.add_notify("sally@somewhere.org");
        assert_eq!(e.notifications(), vec!["bob@example.com", "sally@somewhere.org"]);
    }

    #[test]
    fn test_body_types() {
        let mut e = entry();
        assert_eq!(e.body(), "");
        assert_eq!(e.body_type(), "");
        e.set_body("This is the body");
        assert_eq!(e.body_type(), "text");
        e.set_body_typed("Now this is the body", "full_html");
        assert_eq!(e.body_type(), "full_html");
        assert_eq!(wire_body_type("full_html"), "html");
        assert_eq!(wire_body_type("Filtered_HTML"), "html");
        assert_eq!(wire_body_type("plain_text"), "text");
    }

    #[test]
    fn test_lognumber() {
        let mut e = entry();
        e.set_lognumber(12);
        assert_eq!(e.lognumber(), Some(12));
        e.set_lognumber_str("abc");
        e.set_lognumber(0);
        assert_eq!(e.lognumber(), Some(12));
        e.set_lognumber_str(" 13 ");
        assert_eq!(e.lognumber(), Some(13));
    }

    #[test]
    fn test_created() {
        let mut e = entry();
        e.set_created_str("2004-02-12T15:19:21+00:00").unwrap();
        assert_eq!(
            date::format_created(e.created()),
            "2004-02-12T15:19:21+00:00"
        );
        assert!(e.set_created_str("not a date").is_err());
        e.set_created_epoch(1_000_000_000).unwrap();
        assert_eq!(e.created().timestamp(), 1_000_000_000);
    }

    #[test]
    fn test_minimal_xml() {
        let xml = entry().to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<logbook>TLOG</logbook>"));
        assert!(xml.contains("<title>test</title>"));
        assert!(xml.contains("<Tags/>"));
        assert!(!xml.contains("<lognumber>"));
        assert!(!xml.contains("<body"));
        assert!(!xml.contains("<Notifications"));
    }

    #[test]
    fn test_element_order() {
        let mut e = entry();
        e.set_lognumber(7);
        e.set_body_typed("<b>hi</b>", "filtered_html");
        e.add_notify("x@y.org");
        e.add_reference("atlis", 1);
        e.add_attachment_url("http://h/a.png", None, None);
        let xml = e.to_xml().unwrap();
        let order = [
            "<lognumber>",
            "<created>",
            "<title>",
            "<Author>",
            "<Logbooks>",
            "<Tags",
            "<Entrymakers",
            "<body type=\"html\"><![CDATA[<b>hi</b>]]>",
            "<Notifications>",
            "<References>",
            "<Attachments>",
        ];
        let positions: Vec<usize> = order
            .iter()
            .map(|tag| xml.find(tag).unwrap_or_else(|| panic!("missing {tag} in {xml}")))
            .collect();
        assert!(positions.windows(2).all(|p| p[0] < p[1]), "{xml}");
        assert!(xml.contains(r#"<reference type="atlis">1</reference>"#));
    }

    #[test]
    fn test_xml_roundtrip() {
        let mut e = entry();
        e.set_lognumber(3484070);
        e.set_author_with("bob", [("firstname", "Bob")]).unwrap();
        e.add_logbook("ELOG");
        e.add_tag("Readme");
        e.add_entry_maker("sally").unwrap();
        e.set_body("line one\nline <two> & ]]> three");
        e.add_notify("ops@example.org");
        e.add_reference("atlis", 100);
        e.add_reference("elog", 100000);
        e.add_attachment_url("http://h/a%20b.png", Some("shot"), Some("image/png"));

        let xml = e.to_xml().unwrap();
        let back = Entry::from_xml(&xml).unwrap();
        assert_eq!(back.lognumber(), Some(3484070));
        assert_eq!(back.author(), e.author());
        assert_eq!(back.body(), e.body());
        assert_eq!(back.attachments(), e.attachments());
        assert_eq!(back.to_xml().unwrap(), xml);
    }

    #[test]
    fn test_blank_title_survives_roundtrip() {
        let mut e = entry();
        e.set_title("   ").unwrap();
        let back = Entry::from_xml(&e.to_xml().unwrap()).unwrap();
        assert_eq!(back.title(), "   ");
    }

    #[test]
    fn test_from_xml_rejects_other_roots() {
        assert!(Entry::from_xml("<Response stat=\"ok\"/>").is_err());
        assert!(Entry::from_xml("garbage").is_err());
    }
}
