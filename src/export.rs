//! Export formats and reconstruction.
//!
//! A trie can be exported in four formats, selected by [`ExportFormat`]:
//!
//! | format   | id | result                                                     |
//! |----------|----|------------------------------------------------------------|
//! | `Serial` | 0  | [`Serial`]: flat pre-order `(delta, symbol, terminal)` records |
//! | `Json`   | 1  | nested `{"c": {"terminal": bool, "children": {..}}}` object |
//! | `Export` | 2  | [`Snapshot`]: the serial records plus word count and options |
//! | `Words`  | 3  | every stored word, lexicographically sorted                 |
//!
//! The `Export` format is the round-trip format: [`Trie::from_export`]
//! rebuilds a trie holding exactly the exported words.
//!
//! ```
//! use wordtrie::export::ExportFormat;
//! use wordtrie::trie::Trie;
//!
//! let trie = Trie::from_words(["cat", "car", "cart", "dog"]);
//! let snapshot = trie.export(ExportFormat::Export).into_snapshot().unwrap();
//! let copy = Trie::from_export(&snapshot).unwrap();
//! assert_eq!(copy, trie);
//!
//! let words = trie.export(ExportFormat::Words);
//! assert_eq!(words.to_string(), "car\ncart\ncat\ndog\n");
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{TrieError, TrieResult};
use crate::trie::{Node, Trie, TrieOptions};

/// Selects one of the export formats. The discriminants are the fixed
/// format identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ExportFormat {
    Serial = 0,
    Json = 1,
    Export = 2,
    Words = 3,
}

impl ExportFormat {
    /// Every format, in identifier order.
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Serial,
        ExportFormat::Json,
        ExportFormat::Export,
        ExportFormat::Words,
    ];

    /// The fixed identifier of this format.
    pub fn id(self) -> u8 {
        self as u8
    }

    /// The name of this format.
    pub fn name(self) -> &'static str {
        match self {
            ExportFormat::Serial => "serial",
            ExportFormat::Json => "json",
            ExportFormat::Export => "export",
            ExportFormat::Words => "words",
        }
    }
}

impl TryFrom<u8> for ExportFormat {
    type Error = TrieError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.id() == id)
            .ok_or_else(|| TrieError::UnsupportedFormat(id.to_string()))
    }
}

impl FromStr for ExportFormat {
    type Err = TrieError;

    /// Accepts a format name (in any case) or its identifier.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return ExportFormat::try_from(id);
        }
        ExportFormat::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| TrieError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One node of a trie in a pre-order walk.
///
/// `delta` is the depth of this node minus the depth of the node described
/// by the previous record. The head has depth 0, so the first record always
/// has a delta of 1 and no delta is ever greater than 1.
///
/// Serialized as a `[delta, symbol, terminal]` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, char, bool)", into = "(i64, char, bool)")]
pub struct SerialRecord {
    pub delta: i64,
    pub symbol: char,
    pub terminal: bool,
}

impl From<(i64, char, bool)> for SerialRecord {
    fn from((delta, symbol, terminal): (i64, char, bool)) -> Self {
        Self {
            delta,
            symbol,
            terminal,
        }
    }
}

impl From<SerialRecord> for (i64, char, bool) {
    fn from(record: SerialRecord) -> Self {
        (record.delta, record.symbol, record.terminal)
    }
}

/// The flat serial form of a trie.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Serial {
    /// Is the empty word stored?
    pub root_terminal: bool,
    pub records: Vec<SerialRecord>,
}

/// A self-describing snapshot of a trie, accepted by [`Trie::from_export`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Number of words stored.
    pub count: usize,
    #[serde(flatten)]
    pub options: TrieOptions,
    #[serde(flatten)]
    pub serial: Serial,
}

impl Snapshot {
    /// Parse a snapshot from its JSON text.
    pub fn from_json_str(s: &str) -> TrieResult<Self> {
        Ok(serde_json::from_str(s)?)
    }
}

/// The result of exporting a trie.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Exported {
    Serial(Serial),
    Json(Value),
    Export(Snapshot),
    Words(Vec<String>),
}

impl Exported {
    /// The format this result was exported in.
    pub fn format(&self) -> ExportFormat {
        match self {
            Exported::Serial(_) => ExportFormat::Serial,
            Exported::Json(_) => ExportFormat::Json,
            Exported::Export(_) => ExportFormat::Export,
            Exported::Words(_) => ExportFormat::Words,
        }
    }

    /// The serial form, if this is a `Serial` export.
    pub fn into_serial(self) -> Option<Serial> {
        match self {
            Exported::Serial(serial) => Some(serial),
            _ => None,
        }
    }

    /// The nested JSON value, if this is a `Json` export.
    pub fn into_json(self) -> Option<Value> {
        match self {
            Exported::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The snapshot, if this is an `Export` export.
    pub fn into_snapshot(self) -> Option<Snapshot> {
        match self {
            Exported::Export(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// The sorted words, if this is a `Words` export.
    pub fn into_words(self) -> Option<Vec<String>> {
        match self {
            Exported::Words(words) => Some(words),
            _ => None,
        }
    }

    /// Serialize the result as JSON text.
    pub fn to_json_string(&self) -> TrieResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Words are written one per line, everything else as JSON text.
impl fmt::Display for Exported {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exported::Words(words) => words.iter().try_for_each(|w| writeln!(f, "{}", w)),
            other => {
                let text = serde_json::to_string(other).map_err(|_| fmt::Error)?;
                f.write_str(&text)
            }
        }
    }
}

impl Trie {
    /// Export the Trie in the selected format.
    pub fn export(&self, format: ExportFormat) -> Exported {
        let exported = match format {
            ExportFormat::Serial => Exported::Serial(self.serial()),
            ExportFormat::Json => Exported::Json(self.to_json()),
            ExportFormat::Export => Exported::Export(self.snapshot()),
            ExportFormat::Words => Exported::Words(self.words().collect()),
        };
        debug!(%format, words = self.count, "exported trie");
        exported
    }

    /// Export the Trie in the format with the supplied identifier.
    pub fn export_by_id(&self, id: u8) -> TrieResult<Exported> {
        ExportFormat::try_from(id).map(|format| self.export(format))
    }

    /// Export the Trie in the format with the supplied name (or identifier).
    pub fn export_by_name(&self, name: &str) -> TrieResult<Exported> {
        name.parse().map(|format| self.export(format))
    }

    /// The flat serial form of the Trie.
    pub fn serial(&self) -> Serial {
        Serial {
            root_terminal: self.head.terminated,
            records: self.records().collect(),
        }
    }

    /// A self-describing snapshot of the Trie.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            count: self.count,
            options: self.options,
            serial: self.serial(),
        }
    }

    /// The nested JSON form of the Trie. The empty word has no
    /// representation in this form.
    ///
    /// Building the value is iterative, but serializing or dropping a
    /// [`Value`] recurses once per level. Pass the result of a trie holding
    /// very long words to [`dismantle_json`] instead of dropping it.
    pub fn to_json(&self) -> Value {
        let children = self.fold_children(|node, children| {
            let mut entry = Map::new();
            entry.insert("terminal".to_string(), Value::Bool(node.terminated));
            entry.insert("children".to_string(), object(children));
            (node.symbol, Value::Object(entry))
        });
        object(children)
    }

    /// Rebuild a Trie from a snapshot.
    pub fn from_export(snapshot: &Snapshot) -> TrieResult<Self> {
        let trie = assemble(&snapshot.serial, snapshot.options)?;
        if trie.count != snapshot.count {
            return Err(rejected(format!(
                "snapshot claims {} words but holds {}",
                snapshot.count, trie.count
            )));
        }
        debug!(words = trie.count, "rebuilt trie from snapshot");
        Ok(trie)
    }

    /// Rebuild a Trie from its serial form.
    pub fn from_serial(serial: &Serial) -> TrieResult<Self> {
        assemble(serial, TrieOptions::new())
    }

    /// Rebuild a Trie from its nested JSON form.
    pub fn from_json(value: &Value) -> TrieResult<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| rejected("expected an object of symbols"))?;
        let mut count = 0;
        let mut stack = vec![(map.iter(), Frame::new('\0', false, 0))];
        loop {
            let top = stack.len() - 1;
            match stack[top].0.next() {
                Some((key, entry)) => {
                    let frame = json_frame(key, entry, top + 1)?;
                    count += usize::from(frame.terminated);
                    let children = entry
                        .get("children")
                        .and_then(Value::as_object)
                        .ok_or_else(|| rejected(format!("symbol {:?} has no children object", key)))?;
                    stack.push((children.iter(), frame));
                }
                None if top == 0 => break,
                None => {
                    if let Some((_, frame)) = stack.pop() {
                        stack[top - 1].1.adopt(frame)?;
                    }
                }
            }
        }
        let head = stack
            .pop()
            .map(|(_, frame)| frame.finish())
            .unwrap_or_default();
        debug!(words = count, "rebuilt trie from json");
        Ok(Trie {
            head,
            count,
            options: TrieOptions::new(),
        })
    }
}

impl TryFrom<&Snapshot> for Trie {
    type Error = TrieError;

    fn try_from(snapshot: &Snapshot) -> Result<Self, Self::Error> {
        Trie::from_export(snapshot)
    }
}

impl Serialize for Trie {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.snapshot().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Trie {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let snapshot = Snapshot::deserialize(deserializer)?;
        Trie::from_export(&snapshot).map_err(serde::de::Error::custom)
    }
}

fn object(entries: Vec<(char, Value)>) -> Value {
    Value::Object(
        entries
            .into_iter()
            .map(|(symbol, value)| (symbol.to_string(), value))
            .collect::<Map<String, Value>>(),
    )
}

fn rejected(reason: impl Into<String>) -> TrieError {
    let err = TrieError::malformed(reason);
    debug!(%err, "rejected export payload");
    err
}

fn json_frame(key: &str, entry: &Value, depth: usize) -> TrieResult<Frame> {
    let mut chars = key.chars();
    let symbol = match (chars.next(), chars.next()) {
        (Some(symbol), None) => symbol,
        _ => return Err(rejected(format!("key {:?} is not a single symbol", key))),
    };
    let terminated = entry
        .get("terminal")
        .and_then(Value::as_bool)
        .ok_or_else(|| rejected(format!("symbol {:?} has no terminal flag", key)))?;
    Ok(Frame::new(symbol, terminated, depth))
}

/// A node under construction.
struct Frame {
    symbol: char,
    terminated: bool,
    depth: usize,
    children: Vec<Node>,
}

impl Frame {
    fn new(symbol: char, terminated: bool, depth: usize) -> Self {
        Self {
            symbol,
            terminated,
            depth,
            children: vec![],
        }
    }

    fn finish(self) -> Node {
        Node {
            children: self.children,
            symbol: self.symbol,
            terminated: self.terminated,
        }
    }

    /// Attach a completed child, keeping children sorted.
    fn adopt(&mut self, child: Frame) -> TrieResult<()> {
        if !child.terminated && child.children.is_empty() {
            return Err(rejected(format!(
                "symbol {:?} at depth {} does not lead to a word",
                child.symbol, child.depth
            )));
        }
        match self.child_index(child.symbol) {
            Ok(_) => Err(rejected(format!(
                "symbol {:?} appears twice at depth {}",
                child.symbol, child.depth
            ))),
            Err(i) => {
                self.children.insert(i, child.finish());
                Ok(())
            }
        }
    }

    fn child_index(&self, symbol: char) -> Result<usize, usize> {
        // Serial input arrives in order, so check the end first
        match self.children.last() {
            Some(last) if last.symbol < symbol => Err(self.children.len()),
            None => Err(0),
            _ => self.children.binary_search_by_key(&symbol, |n| n.symbol),
        }
    }
}

fn assemble(serial: &Serial, options: TrieOptions) -> TrieResult<Trie> {
    let mut count = usize::from(serial.root_terminal);
    // stack[d] is the open node at depth d
    let mut stack = vec![Frame::new('\0', serial.root_terminal, 0)];

    for (position, record) in serial.records.iter().enumerate() {
        let previous = (stack.len() - 1) as i64;
        if record.delta > 1 || previous + record.delta < 1 {
            return Err(rejected(format!(
                "record {} moves by {} from depth {}",
                position, record.delta, previous
            )));
        }
        if options.folds_case() && !is_lowercase(record.symbol) {
            return Err(rejected(format!(
                "record {} holds {:?} but the trie folds case",
                position, record.symbol
            )));
        }
        let depth = previous + record.delta;
        unwind(&mut stack, depth as usize)?;
        count += usize::from(record.terminal);
        stack.push(Frame::new(record.symbol, record.terminal, depth as usize));
    }
    unwind(&mut stack, 1)?;

    let head = stack.pop().map(Frame::finish).unwrap_or_default();
    debug!(words = count, records = serial.records.len(), "assembled trie");
    Ok(Trie {
        head,
        count,
        options,
    })
}

// Folded words only ever hold symbols which lowercase to themselves
fn is_lowercase(symbol: char) -> bool {
    let mut lower = symbol.to_lowercase();
    lower.next() == Some(symbol) && lower.next().is_none()
}

/// Drop a nested JSON value without recursing once per level.
pub fn dismantle_json(value: Value) {
    let mut pending = vec![value];
    while let Some(value) = pending.pop() {
        match value {
            Value::Object(map) => pending.extend(map.into_iter().map(|(_, v)| v)),
            Value::Array(values) => pending.extend(values),
            _ => {}
        }
    }
}

/// Close open frames until only `depth` remain.
fn unwind(stack: &mut Vec<Frame>, depth: usize) -> TrieResult<()> {
    while stack.len() > depth.max(1) {
        if let Some(frame) = stack.pop() {
            if let Some(parent) = stack.last_mut() {
                parent.adopt(frame)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn records(triples: &[(i64, char, bool)]) -> Vec<SerialRecord> {
        triples.iter().copied().map(SerialRecord::from).collect()
    }

    #[test]
    fn it_maps_format_identifiers() {
        for (id, format) in ExportFormat::ALL.into_iter().enumerate() {
            assert_eq!(format.id() as usize, id);
            assert_eq!(ExportFormat::try_from(id as u8).unwrap(), format);
        }
        assert!(matches!(
            ExportFormat::try_from(4u8),
            Err(TrieError::UnsupportedFormat(ref s)) if s == "4"
        ));
    }

    #[test]
    fn it_parses_format_names() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("words".parse::<ExportFormat>().unwrap(), ExportFormat::Words);
        assert_eq!("0".parse::<ExportFormat>().unwrap(), ExportFormat::Serial);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert!("9".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn it_rejects_unsupported_selectors() {
        let trie = Trie::from_words(["a"]);
        assert!(matches!(
            trie.export_by_id(7),
            Err(TrieError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            trie.export_by_name("yaml"),
            Err(TrieError::UnsupportedFormat(_))
        ));
        assert_eq!(trie.export_by_id(3).unwrap().format(), ExportFormat::Words);
        assert!(trie.contains("a"));
    }

    #[test]
    fn it_exports_sorted_words() {
        let trie = Trie::from_words(["cat", "car", "cart", "dog"]);
        let words = trie.export(ExportFormat::Words).into_words().unwrap();
        assert_eq!(words, vec!["car", "cart", "cat", "dog"]);
    }

    #[test]
    fn it_exports_nested_json() {
        let trie = Trie::from_words(["ab"]);
        let value = trie.export(ExportFormat::Json).into_json().unwrap();
        assert_eq!(
            value,
            json!({
                "a": {
                    "terminal": false,
                    "children": {
                        "b": { "terminal": true, "children": {} }
                    }
                }
            })
        );
        assert_eq!(value["a"]["children"]["b"]["terminal"], json!(true));
    }

    #[test]
    fn it_exports_serial_records() {
        let trie = Trie::from_words(["", "ab", "ac", "b"]);
        let serial = trie.export(ExportFormat::Serial).into_serial().unwrap();
        assert!(serial.root_terminal);
        assert_eq!(
            serial.records,
            records(&[(1, 'a', false), (1, 'b', true), (0, 'c', true), (-1, 'b', true)])
        );
        assert_eq!(
            serde_json::to_value(&serial).unwrap(),
            json!({
                "root_terminal": true,
                "records": [[1, "a", false], [1, "b", true], [0, "c", true], [-1, "b", true]]
            })
        );
    }

    #[test]
    fn it_round_trips_through_export() {
        let trie = Trie::from_words(["", "app", "apple", "apps", "bob", "ban", "banana"]);
        let snapshot = trie.export(ExportFormat::Export).into_snapshot().unwrap();
        assert_eq!(snapshot.count, 7);
        let copy = Trie::from_export(&snapshot).unwrap();
        assert_eq!(copy, trie);
        assert!(copy.contains(""));
        assert!(copy.contains("banana"));
        assert!(!copy.contains("bana"));
    }

    #[test]
    fn it_round_trips_through_json_text() {
        let mut trie = Trie::with_options(TrieOptions::new().fold_case(true));
        trie.add_words(["Hello", "help"]);
        let text = trie.export(ExportFormat::Export).to_json_string().unwrap();
        let snapshot = Snapshot::from_json_str(&text).unwrap();
        let copy = Trie::from_export(&snapshot).unwrap();
        assert!(copy.options().folds_case());
        assert!(copy.contains("HELP"));

        let via_serde: Trie = serde_json::from_str(&serde_json::to_string(&trie).unwrap()).unwrap();
        assert_eq!(via_serde, trie);
    }

    #[test]
    fn it_rebuilds_from_json() {
        let trie = Trie::from_words(["cat", "car", "cart", "dog"]);
        let copy = Trie::from_json(&trie.to_json()).unwrap();
        assert_eq!(copy, trie);
        assert_eq!(copy.count(), 4);
    }

    #[test]
    fn it_rebuilds_from_serial() {
        let trie = Trie::from_words(["x", "xy", "z"]);
        assert_eq!(Trie::from_serial(&trie.serial()).unwrap(), trie);
        assert_eq!(Trie::from_serial(&Serial::default()).unwrap(), Trie::new());
    }

    #[test]
    fn it_rejects_malformed_serial_data() {
        let jump = Serial {
            root_terminal: false,
            records: records(&[(2, 'a', true)]),
        };
        assert!(matches!(
            Trie::from_serial(&jump),
            Err(TrieError::MalformedExport(_))
        ));

        let above_head = Serial {
            root_terminal: false,
            records: records(&[(1, 'a', true), (-1, 'b', true)]),
        };
        assert!(Trie::from_serial(&above_head).is_err());

        let dead_branch = Serial {
            root_terminal: false,
            records: records(&[(1, 'a', false), (1, 'b', false)]),
        };
        assert!(Trie::from_serial(&dead_branch).is_err());

        let duplicate = Serial {
            root_terminal: false,
            records: records(&[(1, 'a', true), (0, 'a', true)]),
        };
        assert!(Trie::from_serial(&duplicate).is_err());
    }

    #[test]
    fn it_rejects_uppercase_symbols_when_folding_case() {
        let snapshot = Snapshot {
            count: 1,
            options: TrieOptions::new().fold_case(true),
            serial: Serial {
                root_terminal: false,
                records: records(&[(1, 'A', true)]),
            },
        };
        assert!(matches!(
            Trie::from_export(&snapshot),
            Err(TrieError::MalformedExport(_))
        ));

        let exact = Snapshot {
            options: TrieOptions::new(),
            ..snapshot.clone()
        };
        assert!(Trie::from_export(&exact).unwrap().contains("A"));

        let mut folded = Trie::with_options(TrieOptions::new().fold_case(true));
        folded.add_words(["ÉCOLE", "Straße"]);
        assert_eq!(Trie::from_export(&folded.snapshot()).unwrap(), folded);
    }

    #[test]
    fn it_exports_json_for_very_long_words() {
        let long = "a".repeat(5_000);
        let trie = Trie::from_words([long.as_str(), "b"]);
        let value = trie.export(ExportFormat::Json).into_json().unwrap();

        let mut depth = 0;
        let mut node = &value["a"];
        while let Some(entry) = node.as_object() {
            depth += 1;
            if depth == long.len() {
                assert_eq!(entry["terminal"], json!(true));
                assert_eq!(entry["children"], json!({}));
            } else {
                assert_eq!(entry["terminal"], json!(false));
            }
            node = &entry["children"]["a"];
        }
        assert_eq!(depth, long.len());
        assert_eq!(value["b"]["terminal"], json!(true));
        dismantle_json(value);
    }

    #[test]
    fn it_accepts_unordered_siblings() {
        let serial = Serial {
            root_terminal: false,
            records: records(&[(1, 'b', true), (0, 'a', true)]),
        };
        let trie = Trie::from_serial(&serial).unwrap();
        assert_eq!(trie.words().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn it_rejects_wrong_word_counts() {
        let mut snapshot = Trie::from_words(["a", "b"]).snapshot();
        snapshot.count = 3;
        assert!(matches!(
            Trie::from_export(&snapshot),
            Err(TrieError::MalformedExport(_))
        ));
    }

    #[test]
    fn it_rejects_malformed_json() {
        assert!(Trie::from_json(&json!([])).is_err());
        assert!(Trie::from_json(&json!({"ab": {"terminal": true, "children": {}}})).is_err());
        assert!(Trie::from_json(&json!({"a": {"children": {}}})).is_err());
        assert!(Trie::from_json(&json!({"a": {"terminal": true}})).is_err());
        assert!(Trie::from_json(&json!({"a": {"terminal": false, "children": {}}})).is_err());
        assert_eq!(Trie::from_json(&json!({})).unwrap(), Trie::new());
    }

    #[test]
    fn it_displays_exports() {
        let trie = Trie::from_words(["b", "a"]);
        assert_eq!(trie.export(ExportFormat::Words).to_string(), "a\nb\n");
        assert_eq!(
            trie.export(ExportFormat::Serial).to_string(),
            r#"{"root_terminal":false,"records":[[1,"a",true],[0,"b",true]]}"#
        );
        assert_eq!(
            trie.export(ExportFormat::Export).to_string(),
            r#"{"count":2,"fold_case":false,"root_terminal":false,"records":[[1,"a",true],[0,"b",true]]}"#
        );
    }
}
