//! SEC EDGAR endpoint URLs.

/// Ticker registry: integer-indexed object of `{cik_str, ticker, title}`.
pub const TICKER_REGISTRY_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Base for the data APIs (submissions, companyfacts).
pub const DATA_BASE_URL: &str = "https://data.sec.gov";

/// Submission history for a company.
#[must_use]
pub fn submissions_url(cik: &str) -> String {
    format!("{DATA_BASE_URL}/submissions/CIK{cik}.json")
}

/// Older-filings archive blob advertised inside the submissions response.
#[must_use]
pub fn submissions_archive_url(archive_name: &str) -> String {
    format!("{DATA_BASE_URL}/submissions/{archive_name}")
}

/// All historical XBRL facts for a company.
#[must_use]
pub fn company_facts_url(cik: &str) -> String {
    format!("{DATA_BASE_URL}/api/xbrl/companyfacts/CIK{cik}.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_shapes() {
        assert_eq!(
            submissions_url("0000320193"),
            "https://data.sec.gov/submissions/CIK0000320193.json"
        );
        assert_eq!(
            company_facts_url("0000320193"),
            "https://data.sec.gov/api/xbrl/companyfacts/CIK0000320193.json"
        );
        assert_eq!(
            submissions_archive_url("CIK0000320193-submissions-001.json"),
            "https://data.sec.gov/submissions/CIK0000320193-submissions-001.json"
        );
    }
}
