//! Fold multiple OpenCover reports into a single coverage model.

use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::model::Coverage;
use crate::parser;

/// Parse every report and merge the results into one [`Coverage`].
///
/// With `keep_going`, a report that fails to parse is logged and skipped;
/// otherwise the first failure aborts and no coverage is returned.
pub fn aggregate<P: AsRef<Path>>(reports: &[P], keep_going: bool) -> Result<Coverage> {
    let mut coverage = Coverage::new();

    for report in reports {
        let report = report.as_ref();
        match parser::parse_file(report) {
            Ok(parsed) => coverage.merge(parsed),
            Err(err) if keep_going => {
                warn!(report = %report.display(), error = %err, "skipping unparseable report");
            }
            Err(err) => return Err(err),
        }
    }

    Ok(coverage)
}
