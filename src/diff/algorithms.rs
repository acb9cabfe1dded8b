use std::fmt;
use std::ops::{Range, RangeInclusive};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use similar::algorithms::{myers, DiffHook};

use crate::config::AlignConfig;
use crate::error::{DiffError, Result};

/// Trait defining an alignment algorithm over comparison units
pub trait Aligner: Send + Sync {
    /// Compute a minimal edit script turning `expected` into `actual`
    fn align(&self, expected: &[&str], actual: &[&str]) -> Result<EditScript>;

    /// Get the algorithm name
    fn name(&self) -> &'static str;

    /// Get algorithm description
    fn description(&self) -> &'static str;
}

/// Kind of an edit operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Insert,
    Delete,
}

/// A run of units that is equal, inserted or deleted.
///
/// Ranges index comparison units. An `Insert` has an empty expected range
/// positioned where the insertion happens, a `Delete` an empty actual range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditOp {
    pub tag: OpTag,
    pub expected: Range<usize>,
    pub actual: Range<usize>,
}

impl EditOp {
    pub fn equal(expected_start: usize, actual_start: usize, len: usize) -> Self {
        Self {
            tag: OpTag::Equal,
            expected: expected_start..expected_start + len,
            actual: actual_start..actual_start + len,
        }
    }

    pub fn delete(expected_start: usize, len: usize, actual_at: usize) -> Self {
        Self {
            tag: OpTag::Delete,
            expected: expected_start..expected_start + len,
            actual: actual_at..actual_at,
        }
    }

    pub fn insert(expected_at: usize, actual_start: usize, len: usize) -> Self {
        Self {
            tag: OpTag::Insert,
            expected: expected_at..expected_at,
            actual: actual_start..actual_start + len,
        }
    }

    /// Number of units in the run
    pub fn len(&self) -> usize {
        match self.tag {
            OpTag::Insert => self.actual.len(),
            OpTag::Equal | OpTag::Delete => self.expected.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_change(&self) -> bool {
        self.tag != OpTag::Equal
    }

    /// The same run seen from the other side
    pub fn inverted(&self) -> Self {
        let tag = match self.tag {
            OpTag::Equal => OpTag::Equal,
            OpTag::Insert => OpTag::Delete,
            OpTag::Delete => OpTag::Insert,
        };
        Self {
            tag,
            expected: self.actual.clone(),
            actual: self.expected.clone(),
        }
    }
}

/// Ordered operations covering both inputs without gaps or overlaps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditScript {
    ops: Vec<EditOp>,
}

impl EditScript {
    /// Build a script from raw operations, merging adjacent runs of the same
    /// kind and ordering each change group as `Delete` then `Insert`.
    pub fn from_ops(ops: Vec<EditOp>) -> Result<Self> {
        let mut script = ScriptBuilder::default();
        script
            .ops
            .try_reserve(ops.len())
            .map_err(|_| DiffError::allocation("alignment"))?;
        for op in ops {
            script.push(op)?;
        }
        script.into_script()
    }

    pub fn ops(&self) -> &[EditOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<EditOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Inserted plus deleted units
    pub fn edit_distance(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| op.is_change())
            .map(EditOp::len)
            .sum()
    }

    pub fn deleted_units(&self) -> usize {
        self.units_tagged(OpTag::Delete)
    }

    pub fn inserted_units(&self) -> usize {
        self.units_tagged(OpTag::Insert)
    }

    fn units_tagged(&self, tag: OpTag) -> usize {
        self.ops
            .iter()
            .filter(|op| op.tag == tag)
            .map(EditOp::len)
            .sum()
    }

    pub fn expected_len(&self) -> usize {
        self.ops.last().map_or(0, |op| op.expected.end)
    }

    pub fn actual_len(&self) -> usize {
        self.ops.last().map_or(0, |op| op.actual.end)
    }

    /// Script transforming `actual` into `expected`
    pub fn inverted(&self) -> Result<Self> {
        Self::from_ops(self.ops.iter().map(EditOp::inverted).collect())
    }
}

/// Collects hook callbacks into a normalized `EditScript`.
///
/// Change groups are buffered until the next equal run so deletions can be
/// emitted ahead of insertions whatever order the algorithm reports them in.
#[derive(Debug, Default)]
struct ScriptBuilder {
    ops: Vec<EditOp>,
    pending_delete: Option<EditOp>,
    pending_insert: Option<EditOp>,
}

impl ScriptBuilder {
    fn push(&mut self, op: EditOp) -> Result<()> {
        if op.is_empty() {
            return Ok(());
        }
        match op.tag {
            OpTag::Equal => {
                self.flush_changes()?;
                self.append(op)
            }
            OpTag::Delete => {
                Self::extend_pending(&mut self.pending_delete, op);
                Ok(())
            }
            OpTag::Insert => {
                Self::extend_pending(&mut self.pending_insert, op);
                Ok(())
            }
        }
    }

    fn extend_pending(slot: &mut Option<EditOp>, op: EditOp) {
        match slot {
            Some(pending) => {
                pending.expected.start = pending.expected.start.min(op.expected.start);
                pending.expected.end = pending.expected.end.max(op.expected.end);
                pending.actual.start = pending.actual.start.min(op.actual.start);
                pending.actual.end = pending.actual.end.max(op.actual.end);
            }
            None => *slot = Some(op),
        }
    }

    fn flush_changes(&mut self) -> Result<()> {
        let delete = self.pending_delete.take();
        let insert = self.pending_insert.take();

        match (delete, insert) {
            (Some(mut delete), Some(mut insert)) => {
                // the group starts where the deletion starts on the expected
                // side and where the insertion starts on the actual side
                delete.actual = insert.actual.start..insert.actual.start;
                insert.expected = delete.expected.end..delete.expected.end;
                self.append(delete)?;
                self.append(insert)
            }
            (Some(op), None) | (None, Some(op)) => self.append(op),
            (None, None) => Ok(()),
        }
    }

    fn append(&mut self, op: EditOp) -> Result<()> {
        if let Some(last) = self.ops.last_mut() {
            if last.tag == op.tag
                && last.expected.end == op.expected.start
                && last.actual.end == op.actual.start
            {
                last.expected.end = op.expected.end;
                last.actual.end = op.actual.end;
                return Ok(());
            }
        }
        self.ops
            .try_reserve(1)
            .map_err(|_| DiffError::allocation("alignment"))?;
        self.ops.push(op);
        Ok(())
    }

    fn into_script(mut self) -> Result<EditScript> {
        self.flush_changes()?;
        Ok(EditScript { ops: self.ops })
    }
}

impl DiffHook for ScriptBuilder {
    type Error = DiffError;

    fn equal(&mut self, old_index: usize, new_index: usize, len: usize) -> Result<()> {
        self.push(EditOp::equal(old_index, new_index, len))
    }

    fn delete(&mut self, old_index: usize, old_len: usize, new_index: usize) -> Result<()> {
        self.push(EditOp::delete(old_index, old_len, new_index))
    }

    fn insert(&mut self, old_index: usize, new_index: usize, new_len: usize) -> Result<()> {
        self.push(EditOp::insert(old_index, new_index, new_len))
    }

    fn finish(&mut self) -> Result<()> {
        self.flush_changes()
    }
}

/// Myers diff algorithm implementation
///
/// `similar`'s linear-space Myers settles the edit distance. The final script
/// is then picked among all scripts of that length by [`EditGrid`], searching
/// only the diagonals a minimal path can touch. When that band would exceed
/// `band_max_cells` the Myers script is kept as it is.
#[derive(Debug, Clone, Copy)]
pub struct MyersAligner {
    band_max_cells: usize,
}

impl MyersAligner {
    pub fn new(band_max_cells: usize) -> Self {
        Self { band_max_cells }
    }

    pub fn band_max_cells(&self) -> usize {
        self.band_max_cells
    }
}

impl Default for MyersAligner {
    fn default() -> Self {
        Self::new(AlignConfig::default().band_max_cells)
    }
}

impl Aligner for MyersAligner {
    fn align(&self, expected: &[&str], actual: &[&str]) -> Result<EditScript> {
        let mut builder = ScriptBuilder::default();
        myers::diff(&mut builder, expected, 0..expected.len(), actual, 0..actual.len())?;
        let script = builder.into_script()?;
        if script.edit_distance() == 0 {
            return Ok(script);
        }

        let grid = EditGrid::new(expected, actual);
        // a minimal path never strays further from the main diagonal
        let band = -(script.inserted_units() as isize)..=script.deleted_units() as isize;

        match grid.cells(&band) {
            Some(cells) if cells <= self.band_max_cells => {
                Ok(grid.earliest_script(band)?.unwrap_or(script))
            }
            _ => {
                tracing::debug!(
                    expected = expected.len(),
                    actual = actual.len(),
                    edit_distance = script.edit_distance(),
                    band_max_cells = self.band_max_cells,
                    "alignment band too large, keeping Myers tie-breaks"
                );
                Ok(script)
            }
        }
    }

    fn name(&self) -> &'static str {
        "Myers"
    }

    fn description(&self) -> &'static str {
        "Myers' O(ND) diff algorithm in linear space - suited to large inputs"
    }
}

/// LCS (Longest Common Subsequence) table alignment
///
/// Searches the whole edit graph, which costs about `N·(N+M)` cells. Beyond
/// `max_cells` the Myers aligner is used instead; both settle ties the same
/// way.
#[derive(Debug, Clone, Copy)]
pub struct LcsAligner {
    max_cells: usize,
    myers: MyersAligner,
}

impl LcsAligner {
    pub fn new(max_cells: usize) -> Self {
        Self {
            max_cells,
            myers: MyersAligner::default(),
        }
    }

    /// Aligner used when the table does not fit
    pub fn with_myers(mut self, myers: MyersAligner) -> Self {
        self.myers = myers;
        self
    }

    pub fn max_cells(&self) -> usize {
        self.max_cells
    }
}

impl Default for LcsAligner {
    fn default() -> Self {
        Self::new(AlignConfig::default().lcs_max_cells)
    }
}

impl Aligner for LcsAligner {
    fn align(&self, expected: &[&str], actual: &[&str]) -> Result<EditScript> {
        let grid = EditGrid::new(expected, actual);
        let band = grid.full_band();

        match grid.cells(&band) {
            Some(cells) if cells <= self.max_cells => match grid.earliest_script(band)? {
                Some(script) => Ok(script),
                None => self.myers.align(expected, actual),
            },
            _ => {
                tracing::debug!(
                    expected = expected.len(),
                    actual = actual.len(),
                    max_cells = self.max_cells,
                    "LCS table too large, aligning with Myers"
                );
                self.myers.align(expected, actual)
            }
        }
    }

    fn name(&self) -> &'static str {
        "LCS"
    }

    fn description(&self) -> &'static str {
        "Longest Common Subsequence table - quadratic, for short inputs"
    }
}

const GROUP_STATES: usize = 4;
/// Previous step was diagonal, or there was none
const OUTSIDE: usize = 0;
const DELETING: usize = 1;
const INSERTING: usize = 2;
const REPLACING: usize = 3;

const NO_STEP: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Diagonal = 1,
    Delete = 2,
    Insert = 3,
}

impl Step {
    fn pack(self, from: usize) -> u8 {
        ((self as u8) << 2) | from as u8
    }

    fn unpack(packed: u8) -> Option<(Self, usize)> {
        let step = match packed >> 2 {
            1 => Self::Diagonal,
            2 => Self::Delete,
            3 => Self::Insert,
            _ => return None,
        };
        Some((step, usize::from(packed & 0b11)))
    }
}

/// Group state after a deletion, and whether it opened a new `Delete` op
fn after_delete(state: usize) -> (usize, bool) {
    match state {
        OUTSIDE => (DELETING, true),
        INSERTING => (REPLACING, true),
        DELETING => (DELETING, false),
        _ => (REPLACING, false),
    }
}

fn after_insert(state: usize) -> (usize, bool) {
    match state {
        OUTSIDE => (INSERTING, true),
        DELETING => (REPLACING, true),
        INSERTING => (INSERTING, false),
        _ => (REPLACING, false),
    }
}

/// Cost of a path from the origin, compared field by field: edits first,
/// then the sum of `i + j` over its matches, then the `Delete`/`Insert` ops
/// left once each change group is merged. None of them depends on which
/// input is called expected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
struct PathCost {
    edits: usize,
    reach: u64,
    ops: usize,
}

impl PathCost {
    fn edit(self, opened: bool) -> Self {
        Self {
            edits: self.edits + 1,
            ops: self.ops + usize::from(opened),
            ..self
        }
    }
}

type CostRow = Vec<[Option<PathCost>; GROUP_STATES]>;

fn cost_row(width: usize) -> Result<CostRow> {
    let mut row = Vec::new();
    row.try_reserve_exact(width)
        .map_err(|_| DiffError::allocation("alignment"))?;
    row.resize(width, [None; GROUP_STATES]);
    Ok(row)
}

fn reached(costs: [Option<PathCost>; GROUP_STATES]) -> impl Iterator<Item = (usize, PathCost)> {
    costs
        .into_iter()
        .enumerate()
        .filter_map(|(state, cost)| cost.map(|cost| (state, cost)))
}

#[derive(Default)]
struct Cell {
    best: [Option<PathCost>; GROUP_STATES],
    steps: [u8; GROUP_STATES],
}

impl Cell {
    fn relax(&mut self, state: usize, cost: PathCost, step: Step, from: usize) {
        if self.best[state].map_or(true, |best| cost < best) {
            self.best[state] = Some(cost);
            self.steps[state] = step.pack(from);
        }
    }
}

/// Edit graph over what is left of both inputs after their common prefix.
///
/// Row `i`, column `j` is the point where `i` expected and `j` actual units
/// have been consumed; diagonal `k = i - j`. Only a band of diagonals is
/// stored, one row at a time, plus a packed back-pointer per cell.
struct EditGrid<'s, 'a> {
    expected: &'s [&'a str],
    actual: &'s [&'a str],
    prefix: usize,
}

impl<'s, 'a> EditGrid<'s, 'a> {
    fn new(expected: &'s [&'a str], actual: &'s [&'a str]) -> Self {
        let prefix = expected
            .iter()
            .zip(actual)
            .take_while(|(e, a)| e == a)
            .count();
        Self {
            expected: &expected[prefix..],
            actual: &actual[prefix..],
            prefix,
        }
    }

    fn full_band(&self) -> RangeInclusive<isize> {
        -(self.actual.len() as isize)..=self.expected.len() as isize
    }

    /// Cells a search of `band` is allowed to use, the same whichever input
    /// is expected
    fn cells(&self, band: &RangeInclusive<isize>) -> Option<usize> {
        let width = usize::try_from(band.end() - band.start() + 1).ok()?;
        let rows = self.expected.len().max(self.actual.len()) + 1;
        rows.checked_mul(width)
    }

    /// The cheapest path inside `band` by [`PathCost`], ties going to
    /// diagonal steps, then deletions. `None` when no path fits in the band.
    fn earliest_script(&self, band: RangeInclusive<isize>) -> Result<Option<EditScript>> {
        let (low, high) = (*band.start(), *band.end());
        let width = match usize::try_from(high - low + 1) {
            Ok(width) if width > 0 => width,
            _ => return Ok(None),
        };
        let (rows, cols) = (self.expected.len(), self.actual.len());
        let slot_of = |i: usize, j: usize| i as isize - j as isize - low;

        let mut trace: Vec<[u8; GROUP_STATES]> = Vec::new();
        trace
            .try_reserve_exact((rows + 1) * width)
            .map_err(|_| DiffError::allocation("alignment"))?;
        trace.resize((rows + 1) * width, [NO_STEP; GROUP_STATES]);

        let mut previous = cost_row(width)?;
        let mut current = cost_row(width)?;

        for i in 0..=rows {
            current.fill([None; GROUP_STATES]);
            let first = (i as isize - high).max(0);
            let last = (i as isize - low).min(cols as isize);

            for j in first..=last {
                let j = j as usize;
                let slot = slot_of(i, j) as usize;
                let mut cell = Cell::default();

                if i == 0 && j == 0 {
                    cell.best[OUTSIDE] = Some(PathCost::default());
                }

                if i > 0 && j > 0 && self.expected[i - 1] == self.actual[j - 1] {
                    let position = (i - 1 + j - 1) as u64;
                    for (from, cost) in reached(previous[slot]) {
                        let cost = PathCost {
                            reach: cost.reach + position,
                            ..cost
                        };
                        cell.relax(OUTSIDE, cost, Step::Diagonal, from);
                    }
                }

                if i > 0 && slot > 0 {
                    for (from, cost) in reached(previous[slot - 1]) {
                        let (to, opened) = after_delete(from);
                        cell.relax(to, cost.edit(opened), Step::Delete, from);
                    }
                }

                if j > 0 && slot + 1 < width {
                    for (from, cost) in reached(current[slot + 1]) {
                        let (to, opened) = after_insert(from);
                        cell.relax(to, cost.edit(opened), Step::Insert, from);
                    }
                }

                current[slot] = cell.best;
                trace[i * width + slot] = cell.steps;
            }

            std::mem::swap(&mut previous, &mut current);
        }

        // the last row now sits in `previous`
        let end = usize::try_from(slot_of(rows, cols))
            .ok()
            .and_then(|slot| previous.get(slot).copied());
        let Some(mut state) = end.and_then(|costs| {
            reached(costs)
                .min_by_key(|(_, cost)| *cost)
                .map(|(state, _)| state)
        }) else {
            return Ok(None);
        };

        let mut steps = Vec::new();
        steps
            .try_reserve_exact(rows + cols)
            .map_err(|_| DiffError::allocation("alignment"))?;
        let (mut i, mut j) = (rows, cols);
        while let Some((step, from)) =
            Step::unpack(trace[i * width + slot_of(i, j) as usize][state])
        {
            steps.push(step);
            match step {
                Step::Diagonal => {
                    i -= 1;
                    j -= 1;
                }
                Step::Delete => i -= 1,
                Step::Insert => j -= 1,
            }
            state = from;
        }

        let mut builder = ScriptBuilder::default();
        builder.push(EditOp::equal(0, 0, self.prefix))?;
        let (mut i, mut j) = (self.prefix, self.prefix);
        for step in steps.into_iter().rev() {
            match step {
                Step::Diagonal => {
                    builder.push(EditOp::equal(i, j, 1))?;
                    i += 1;
                    j += 1;
                }
                Step::Delete => {
                    builder.push(EditOp::delete(i, 1, j))?;
                    i += 1;
                }
                Step::Insert => {
                    builder.push(EditOp::insert(i, j, 1))?;
                    j += 1;
                }
            }
        }
        builder.into_script().map(Some)
    }
}

/// Available alignment algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignAlgorithm {
    #[default]
    Myers,
    Lcs,
}

impl AlignAlgorithm {
    pub fn all() -> &'static [AlignAlgorithm] {
        &[Self::Myers, Self::Lcs]
    }

    pub fn create(&self, config: &AlignConfig) -> Box<dyn Aligner> {
        let myers = MyersAligner::new(config.band_max_cells);
        match self {
            Self::Myers => Box::new(myers),
            Self::Lcs => Box::new(LcsAligner::new(config.lcs_max_cells).with_myers(myers)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Myers => "Myers",
            Self::Lcs => "LCS",
        }
    }
}

impl fmt::Display for AlignAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for AlignAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "myers" => Ok(Self::Myers),
            "lcs" => Ok(Self::Lcs),
            other => Err(format!("unknown alignment algorithm: {other}")),
        }
    }
}
