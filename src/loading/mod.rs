//! Instance loader for the line-oriented lot sizing format.
//!
//! ```text
//! num_periods
//! num_products
//! f_1_0 ... f_1_{T-1}          one row of 0/1 due flags per product
//! ...
//! inventory_cost
//! c_0_0 ... c_0_{P-1}          transition cost matrix, row-major
//! ...
//! ```
//!
//! Blank lines are ignored. A line with the wrong number of tokens, a token
//! that is not an integer, or a missing section aborts the whole load; there
//! is no partial result.

mod error;

pub use error::{LoadError, LoadErrorKind};

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use crate::models::Instance;

/// Parser for lot sizing instance files.
///
/// # Examples
///
/// ```
/// use u_lotsizing::loading::InstanceLoader;
///
/// let text = "4\n2\n0 1 0 1\n0 0 1 0\n5\n0 3\n2 0\n";
/// let inst = InstanceLoader::new().from_text(text).unwrap();
/// assert_eq!(inst.num_periods(), 4);
/// assert_eq!(inst.due_dates_per_product(), &[vec![1, 3], vec![2]]);
/// assert_eq!(inst.inventory_cost(), 5);
/// assert_eq!(inst.num_residual(), 1);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct InstanceLoader;

impl InstanceLoader {
    /// Creates a new loader.
    pub fn new() -> Self {
        Self
    }

    /// Loads an instance from a file.
    pub fn from_path<P: AsRef<Path>>(&self, path: P) -> Result<Instance, LoadError> {
        let path = path.as_ref();
        tracing::info!("Load {}", path.display());
        let file = File::open(path)?;
        self.from_bufread(BufReader::new(file))
    }

    /// Loads an instance from any reader.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Instance, LoadError> {
        self.from_bufread(BufReader::new(reader))
    }

    /// Loads an instance from an in-memory string.
    pub fn from_text(&self, text: &str) -> Result<Instance, LoadError> {
        self.from_bufread(text.as_bytes())
    }

    /// Loads an instance from a buffered reader.
    pub fn from_bufread<R: BufRead>(&self, reader: R) -> Result<Instance, LoadError> {
        let mut lines = Lines::new(reader);

        let num_periods = lines.next_row("number of periods", 1)?.single()?;
        if num_periods == 0 {
            return Err(lines.last_malformed("number of periods must be positive"));
        }
        let num_products = lines.next_row("number of products", 1)?.single()?;

        // sized by the rows actually read, never by the declared count
        let mut due_dates = Vec::new();
        for _ in 0..num_products {
            let row = lines.next_row("due date flags", num_periods)?;
            let mut dues = Vec::new();
            for (period, flag) in row.values()?.into_iter().enumerate() {
                match flag {
                    0 => {}
                    1 => dues.push(period),
                    _ => return Err(row.malformed("due date flags must be 0 or 1")),
                }
            }
            due_dates.push(dues);
        }

        let inventory_cost = lines.next_row("inventory cost", 1)?.single()?;

        let mut transitions = Vec::new();
        for _ in 0..num_products {
            let row = lines.next_row("transition costs", num_products)?;
            transitions.push(
                row.values()?
                    .into_iter()
                    .map(|c| c as i64)
                    .collect::<Vec<_>>(),
            );
        }

        if let Some(row) = lines.next_nonempty()? {
            return Err(row.malformed("unexpected trailing line"));
        }

        let num_items: usize = due_dates.iter().map(Vec::len).sum();
        if num_items > num_periods {
            return Err(LoadError::Malformed {
                line: lines.line_number,
                content: String::new(),
                reason: format!("{num_items} items do not fit in {num_periods} periods"),
            });
        }

        Instance::new(
            num_periods,
            num_products,
            inventory_cost as i64,
            due_dates,
            transitions,
        )
        .ok_or_else(|| LoadError::Malformed {
            line: lines.line_number,
            content: String::new(),
            reason: "inconsistent instance".to_string(),
        })
    }
}

/// One non-empty input line.
struct Row {
    line: usize,
    content: String,
}

impl Row {
    fn tokens(&self) -> impl Iterator<Item = &str> {
        self.content.split_whitespace()
    }

    fn malformed(&self, reason: impl Into<String>) -> LoadError {
        LoadError::Malformed {
            line: self.line,
            content: self.content.clone(),
            reason: reason.into(),
        }
    }

    fn values(&self) -> Result<Vec<usize>, LoadError> {
        self.tokens()
            .map(|t| {
                t.parse::<usize>()
                    .map_err(|_| self.malformed(format!("'{t}' is not a non-negative integer")))
            })
            .collect()
    }

    fn single(&self) -> Result<usize, LoadError> {
        Ok(self.values()?[0])
    }
}

struct Lines<R> {
    reader: R,
    line_number: usize,
    last: Option<(usize, String)>,
}

impl<R: BufRead> Lines<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            last: None,
        }
    }

    fn next_nonempty(&mut self) -> Result<Option<Row>, LoadError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let read = self.reader.read_line(&mut buf).map_err(|e| {
                if e.kind() == std::io::ErrorKind::InvalidData {
                    LoadError::Malformed {
                        line: self.line_number + 1,
                        content: String::new(),
                        reason: "line is not valid UTF-8".to_string(),
                    }
                } else {
                    LoadError::Io(e)
                }
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            let content = buf.trim_end_matches(['\n', '\r']).to_string();
            if content.trim().is_empty() {
                continue;
            }
            self.last = Some((self.line_number, content.clone()));
            return Ok(Some(Row {
                line: self.line_number,
                content,
            }));
        }
    }

    fn next_row(&mut self, section: &'static str, expected: usize) -> Result<Row, LoadError> {
        let row = self
            .next_nonempty()?
            .ok_or(LoadError::UnexpectedEof { section })?;
        let found = row.tokens().count();
        if found != expected {
            return Err(row.malformed(format!(
                "{section}: expected {expected} values, found {found}"
            )));
        }
        Ok(row)
    }

    fn last_malformed(&self, reason: &str) -> LoadError {
        let (line, content) = self.last.clone().unwrap_or_default();
        LoadError::Malformed {
            line,
            content,
            reason: reason.to_string(),
        }
    }
}
