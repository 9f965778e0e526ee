/*
[INPUT]:  Optional date range and user/project filters
[OUTPUT]: Monthly report rows and status summary
[POS]:    HTTP layer - reporting endpoint
[UPDATE]: When report filters or payload change
*/

use crate::http::{Result, TaskdeckClient};
use crate::types::{MonthlyReport, MonthlyReportQuery};

impl TaskdeckClient {
    /// Monthly per-employee report
    ///
    /// GET /tasks/monthly?from={from}&to={to}&userId={userId}&projectId={projectId}
    pub async fn monthly_report(&self, query: &MonthlyReportQuery) -> Result<MonthlyReport> {
        let mut url = self.endpoint_url(&["tasks", "monthly"])?;
        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        self.get_json(url).await
    }
}
