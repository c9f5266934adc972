//! Dynamic table graph accepted by the encoder
//!
//! Hosts describe data as loosely typed tables: keys may be numbers, strings or
//! booleans, and tables may be shared between (or nested inside) one another.
//! The encoder decides from the key set whether a table is an array or an
//! object, and reports the shapes JSON cannot represent.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Shared handle to a table.
pub type TableRef = Rc<RefCell<Table>>;

/// A scalar or a table handle.
#[derive(Clone)]
pub enum Node {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    Table(TableRef),
}

/// Insertion-ordered key/value entries.
#[derive(Debug, Default)]
pub struct Table {
    entries: Vec<(Node, Node)>,
}

impl Node {
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "boolean",
            Node::Number(_) => "number",
            Node::Str(_) => "string",
            Node::Table(_) => "table",
        }
    }

    /// Key identity: scalars compare by value, tables by handle.
    fn same_key(&self, other: &Node) -> bool {
        match (self, other) {
            (Node::Null, Node::Null) => true,
            (Node::Bool(a), Node::Bool(b)) => a == b,
            (Node::Number(a), Node::Number(b)) => a == b,
            (Node::Str(a), Node::Str(b)) => a == b,
            (Node::Table(a), Node::Table(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Node {
    // Tables print as handles so that cyclic graphs can be debugged.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Null => write!(f, "Null"),
            Node::Bool(b) => write!(f, "Bool({b})"),
            Node::Number(n) => write!(f, "Number({n})"),
            Node::Str(s) => write!(f, "Str({s:?})"),
            Node::Table(t) => write!(f, "Table({:p})", Rc::as_ptr(t)),
        }
    }
}

impl Table {
    /// Create an empty table behind a shared handle.
    pub fn new_ref() -> TableRef {
        Rc::new(RefCell::new(Table::default()))
    }

    /// Set `key` to `value`, replacing an existing entry with the same key.
    pub fn set(&mut self, key: impl Into<Node>, value: impl Into<Node>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k.same_key(&key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append `value` at index `len + 1`.
    pub fn push(&mut self, value: impl Into<Node>) {
        let index = (self.entries.len() + 1) as f64;
        self.set(index, value);
    }

    pub fn get(&self, key: &Node) -> Option<&Node> {
        self.entries
            .iter()
            .find(|(k, _)| k.same_key(key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(Node, Node)] {
        &self.entries
    }

    /// Entries in index order when the key set is exactly `1..=len`.
    ///
    /// An empty table counts as a sequence.
    pub fn as_sequence(&self) -> Option<Vec<&Node>> {
        let len = self.entries.len();
        let mut slots: Vec<Option<&Node>> = vec![None; len];

        for (key, value) in &self.entries {
            let Node::Number(n) = key else {
                return None;
            };
            if n.fract() != 0.0 || *n < 1.0 || *n > len as f64 {
                return None;
            }
            let slot = &mut slots[*n as usize - 1];
            if slot.is_some() {
                return None;
            }
            *slot = Some(value);
        }

        slots.into_iter().collect()
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<f64> for Node {
    fn from(n: f64) -> Self {
        Node::Number(n)
    }
}

impl From<i64> for Node {
    fn from(n: i64) -> Self {
        Node::Number(n as f64)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::Str(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::Str(s)
    }
}

impl From<TableRef> for Node {
    fn from(t: TableRef) -> Self {
        Node::Table(t)
    }
}

impl<T: Into<Node>> From<Option<T>> for Node {
    fn from(value: Option<T>) -> Self {
        value.map_or(Node::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_existing_key() {
        let table = Table::new_ref();
        table.borrow_mut().set("tag", "files");
        table.borrow_mut().set("tag", "flags");

        let t = table.borrow();
        assert_eq!(t.len(), 1);
        assert!(matches!(t.get(&Node::from("tag")), Some(Node::Str(s)) if s == "flags"));
    }

    #[test]
    fn test_push_builds_sequence() {
        let table = Table::new_ref();
        table.borrow_mut().push("a");
        table.borrow_mut().push("b");

        let t = table.borrow();
        let seq = t.as_sequence().unwrap();
        assert_eq!(seq.len(), 2);
        assert!(matches!(seq[1], Node::Str(s) if s == "b"));
    }

    #[test]
    fn test_sequence_detection_out_of_order_keys() {
        let table = Table::new_ref();
        table.borrow_mut().set(2i64, "second");
        table.borrow_mut().set(1i64, "first");

        let t = table.borrow();
        let seq = t.as_sequence().unwrap();
        assert!(matches!(seq[0], Node::Str(s) if s == "first"));
    }

    #[test]
    fn test_sequence_detection_rejects_gaps_and_strings() {
        let gap = Table::new_ref();
        gap.borrow_mut().set(1i64, "a");
        gap.borrow_mut().set(3i64, "c");
        assert!(gap.borrow().as_sequence().is_none());

        let mixed = Table::new_ref();
        mixed.borrow_mut().set(1i64, "a");
        mixed.borrow_mut().set("name", "b");
        assert!(mixed.borrow().as_sequence().is_none());

        let fractional = Table::new_ref();
        fractional.borrow_mut().set(1.5, "a");
        assert!(fractional.borrow().as_sequence().is_none());
    }

    #[test]
    fn test_empty_table_is_sequence() {
        assert_eq!(Table::new_ref().borrow().as_sequence().map(|s| s.len()), Some(0));
    }

    #[test]
    fn test_debug_of_cyclic_table_terminates() {
        let table = Table::new_ref();
        table.borrow_mut().set("self", table.clone());
        let rendered = format!("{:?}", table.borrow());
        assert!(rendered.contains("Table(0x"));
    }
}
