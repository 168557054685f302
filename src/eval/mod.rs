//! Per-cell expression evaluation.
//!
//! Text cells go through [`parse::parse_cell`] first; the [`Evaluator`] then
//! resolves the parsed expression, drawing random values from its injected
//! generator and running `select` lookups through its [`LookupCache`].

pub mod cache;
pub mod parse;
pub mod random;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::error::{AssistError, Result};
use crate::gateway::Gateway;
use crate::model::{FieldValue, Value};
use crate::sheet::SheetCell;

pub use cache::{LOOKUP_CACHE_CAPACITY, LookupCache};
pub use parse::{CellExpr, ExpressionError, RandomCall, parse_cell};

/// Resolves cell contents for one import run.
#[derive(Debug)]
pub struct Evaluator<R = StdRng> {
    rng: R,
    cache: LookupCache,
}

impl Evaluator<StdRng> {
    /// Evaluator seeded from the operating system.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }
}

impl Default for Evaluator<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> Evaluator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            cache: LookupCache::new(),
        }
    }

    /// Forgets cached lookups; called at the start of every file import.
    pub fn reset(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &LookupCache {
        &self.cache
    }

    /// Resolves `cell`, located at `address`, into a field value.
    ///
    /// `Ok(None)` means the cell contributes nothing to the record.
    pub fn evaluate<G: Gateway + ?Sized>(
        &mut self,
        cell: &SheetCell,
        address: &str,
        gateway: &mut G,
    ) -> Result<Option<FieldValue>> {
        if cell.is_formula() {
            return Err(AssistError::FormulaNotSupported {
                cell: address.to_string(),
            });
        }
        let text = match &cell.value {
            Value::Null => return Ok(None),
            Value::Text(text) => text,
            other => return Ok(Some(FieldValue::Param(other.clone()))),
        };

        let expr = parse_cell(text).map_err(|err| match err {
            ExpressionError::UnsupportedAssignment(expression) => {
                AssistError::UnsupportedAssignment {
                    cell: address.to_string(),
                    expression,
                }
            }
            ExpressionError::InvalidFunction(expression) => AssistError::InvalidCustomFunction {
                cell: address.to_string(),
                expression,
            },
        })?;

        Ok(match expr {
            CellExpr::Empty | CellExpr::Ignored => None,
            CellExpr::Literal(text) => Some(FieldValue::Param(Value::Text(text))),
            CellExpr::Select(sql) => Some(self.lookup(&sql, address, gateway)?),
            CellExpr::Random(call) => Some(FieldValue::Param(call.generate(&mut self.rng))),
            CellExpr::Opaque(fragment) => {
                trace!(cell = address, %fragment, "passing raw SQL fragment");
                Some(FieldValue::Raw(fragment))
            }
        })
    }

    fn lookup<G: Gateway + ?Sized>(
        &mut self,
        sql: &str,
        address: &str,
        gateway: &mut G,
    ) -> Result<FieldValue> {
        let failed = |reason: String| AssistError::AssignmentQueryFailed {
            cell: address.to_string(),
            expression: sql.to_string(),
            reason,
        };
        match self.cache.resolve(sql, gateway) {
            Ok(Some(row)) => Ok(FieldValue::Param(
                row.first().cloned().unwrap_or(Value::Null),
            )),
            Ok(None) => Err(failed("no results found".to_string())),
            Err(err) => Err(failed(err.to_string())),
        }
    }
}
