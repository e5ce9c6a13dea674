//! Workbook I/O for `.xlsx` files.
//!
//! Reading is streaming: [`WorkbookReader::for_each_row`] walks a worksheet's XML one row at a
//! time straight out of the ZIP container, so a source never has to fit in memory. Alongside the
//! cell text it exposes what the merge needs from each cell: its explicit type (`t` attribute),
//! its style index (`s` attribute), and the row height.
//!
//! Writing goes through [`XlsxPartFactory`], which creates one constant-memory
//! `rust_xlsxwriter` workbook per output part and re-creates the template's cell formats in it.

pub mod cell_ref;
pub mod display;
mod error;
mod xml;
pub mod sheet;
pub mod styles;
pub mod writer;

pub use error::{WorkbookError, WorkbookResult};
pub use sheet::{CellKind, ColumnWidths, SheetCell, SheetRow, WorkbookReader};
pub use styles::{NumberFormat, StyleSheet};
pub use writer::{FormatPalette, XlsxPart, XlsxPartFactory};
