use crate::ais::FlagResult;

/// Fan-in of per-track results.
pub struct ResultAggregator;

impl ResultAggregator {
    /// Concatenates flagged rows from every partial result.
    ///
    /// Blocks are ordered by vessel id so the output does not depend on
    /// completion order; rows inside a block are never reordered.
    pub fn aggregate(partials: Vec<Vec<FlagResult>>) -> Vec<FlagResult> {
        let mut blocks: Vec<Vec<FlagResult>> = partials
            .into_iter()
            .map(|block| block.into_iter().filter(|r| r.is_flagged).collect::<Vec<_>>())
            .filter(|block| !block.is_empty())
            .collect();
        blocks.sort_by_key(|block| block.first().map(FlagResult::vessel_id));
        blocks.into_iter().flatten().collect()
    }
}
