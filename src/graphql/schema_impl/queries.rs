use async_graphql::{Context, Object};

use crate::{
    app_state::AppState,
    auth::extract_claims_from_context,
    catalog::SubjectSummary,
    errors::AppResult,
    models::domain::{QuizResult, ScorePoint, SubjectStats},
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn subjects(&self, ctx: &Context<'_>) -> AppResult<Vec<SubjectSummary>> {
        let state = ctx.data::<AppState>()?;
        Ok(state.catalog.summaries())
    }

    /// The signed-in user's results, newest first.
    async fn quiz_results(
        &self,
        ctx: &Context<'_>,
        limit: Option<i32>,
    ) -> AppResult<Vec<QuizResult>> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx)?;

        let mut results = state.result_service.list_results(&claims.sub).await?;
        if let Some(limit) = limit {
            results.truncate(limit.clamp(0, 100) as usize);
        }
        Ok(results)
    }

    async fn subject_stats(&self, ctx: &Context<'_>) -> AppResult<Vec<SubjectStats>> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx)?;

        state.result_service.subject_stats(&claims.sub).await
    }

    async fn score_history(&self, ctx: &Context<'_>) -> AppResult<Vec<ScorePoint>> {
        let state = ctx.data::<AppState>()?;
        let claims = extract_claims_from_context(ctx)?;

        state.result_service.score_history(&claims.sub).await
    }
}
