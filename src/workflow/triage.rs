use tracing::Instrument;

use crate::cache::AnalysisCache;
use crate::context::AppContext;
use crate::domain::analysis::TicketAnalysis;
use crate::domain::assignment::assignment_queries;
use crate::domain::event::TicketCreated;
use crate::domain::ticket::{Ticket, TicketId, TicketUpdate};
use crate::domain::user::User;
use crate::error::{AppError, AppResult};
use crate::workflow::step::{StepFailure, StepOutcome, run_step};

pub const NOTIFICATION_SUBJECT: &str = "Ticket Assigned";

#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub ticket_id: TicketId,
    pub assignee: Option<User>,
    pub notified: bool,
    pub failure: Option<StepFailure>,
}

impl TriageOutcome {
    pub fn success(&self) -> bool {
        self.failure.is_none()
    }
}

struct TriageReport {
    assignee: Option<User>,
    notified: bool,
}

/// Handles one ticket-created event end to end.
///
/// Never returns an error: every failure is logged and reported through
/// [`TriageOutcome::failure`], flagged with whether a retry could help.
pub async fn run_triage(ctx: &AppContext, event: TicketCreated) -> TriageOutcome {
    let span = tracing::info_span!("triage", ticket_id = %event.ticket_id);
    async move {
        tracing::info!("processing ticket");
        match triage(ctx, &event.ticket_id).await {
            Ok(report) => {
                tracing::info!(
                    assignee = report.assignee.as_ref().map(|user| user.email.as_str()),
                    notified = report.notified,
                    "triage finished"
                );
                TriageOutcome {
                    ticket_id: event.ticket_id,
                    assignee: report.assignee,
                    notified: report.notified,
                    failure: None,
                }
            }
            Err(failure) => {
                tracing::error!(%failure, "triage aborted");
                TriageOutcome {
                    ticket_id: event.ticket_id,
                    assignee: None,
                    notified: false,
                    failure: Some(failure),
                }
            }
        }
    }
    .instrument(span)
    .await
}

async fn triage(ctx: &AppContext, id: &TicketId) -> Result<TriageReport, StepFailure> {
    let ticket = run_step("fetch-ticket", fetch_ticket(ctx, id)).await?;
    run_step("initialize-status", initialize_status(ctx, id)).await?;
    let analysis = run_step("analyze", analyze(ctx, &ticket)).await?;
    let skills = run_step("apply-analysis", apply_analysis(ctx, id, &analysis)).await?;
    let assignee = run_step("assign-moderator", assign_moderator(ctx, id, &skills)).await?;
    let notified = run_step("notify-assignee", notify_assignee(ctx, id, assignee.as_ref())).await?;

    Ok(TriageReport { assignee, notified })
}

pub async fn fetch_ticket(ctx: &AppContext, id: &TicketId) -> AppResult<StepOutcome<Ticket>> {
    Ok(match ctx.tickets.find_ticket(id).await? {
        Some(ticket) => StepOutcome::Ok(ticket),
        None => not_found(id),
    })
}

pub async fn initialize_status(ctx: &AppContext, id: &TicketId) -> AppResult<StepOutcome<()>> {
    Ok(persist(ctx, id, TicketUpdate::initialize()).await?.map(|_| ()))
}

/// Asks the model for an analysis. A failed call degrades to the all-default
/// analysis instead of stopping the run.
pub async fn analyze(ctx: &AppContext, ticket: &Ticket) -> AppResult<StepOutcome<TicketAnalysis>> {
    let cache_key = AnalysisCache::compute_key(ticket);
    if let Some(cache) = &ctx.analysis_cache {
        if let Some(analysis) = cache.lock().await.get(&cache_key) {
            tracing::debug!("reusing cached analysis");
            return Ok(StepOutcome::Ok(analysis));
        }
    }

    match ctx.language_model.analyze_ticket(ticket).await {
        Ok(reply) => {
            tracing::debug!(%reply, "raw model reply");
            let analysis = TicketAnalysis::from_response(Some(&reply));
            remember(ctx, cache_key, &analysis).await;
            Ok(StepOutcome::Ok(analysis))
        }
        Err(err) => Ok(StepOutcome::degraded(
            TicketAnalysis::normalize(None),
            format!("analysis unavailable: {err}"),
        )),
    }
}

async fn remember(ctx: &AppContext, key: String, analysis: &TicketAnalysis) {
    let Some(cache) = &ctx.analysis_cache else {
        return;
    };
    let mut cache = cache.lock().await;
    cache.insert(key, analysis);
    if let Err(err) = cache.save().await {
        tracing::warn!(error = %err, "failed to persist analysis cache");
    }
}

/// Writes priority, notes and skills onto the ticket and moves it to
/// `IN_PROGRESS`. Yields the stored skill list for assignment.
pub async fn apply_analysis(
    ctx: &AppContext,
    id: &TicketId,
    analysis: &TicketAnalysis,
) -> AppResult<StepOutcome<Vec<String>>> {
    tracing::info!(
        summary = %analysis.summary,
        priority = %analysis.priority,
        skills = ?analysis.related_skills,
        "applying analysis"
    );
    let update = TicketUpdate::from_analysis(analysis);
    Ok(persist(ctx, id, update)
        .await?
        .map(|ticket| ticket.related_skills))
}

pub async fn assign_moderator(
    ctx: &AppContext,
    id: &TicketId,
    skills: &[String],
) -> AppResult<StepOutcome<Option<User>>> {
    let mut assignee = None;
    for query in assignment_queries(skills) {
        if let Some(user) = ctx.users.find_user(&query).await? {
            assignee = Some(user);
            break;
        }
    }

    match &assignee {
        Some(user) => tracing::info!(
            assignee = %user.email,
            role = user.role.as_str(),
            "assignee selected"
        ),
        None => tracing::warn!("no moderator or admin available; ticket left unassigned"),
    }

    let update = TicketUpdate::assign(assignee.as_ref().map(|user| user.id.clone()));
    Ok(persist(ctx, id, update).await?.map(|_| assignee))
}

/// Best-effort email to the assignee. Yields whether a message went out.
pub async fn notify_assignee(
    ctx: &AppContext,
    id: &TicketId,
    assignee: Option<&User>,
) -> AppResult<StepOutcome<bool>> {
    let Some(user) = assignee else {
        tracing::debug!("no assignee; skipping notification");
        return Ok(StepOutcome::Ok(false));
    };

    let Some(ticket) = ctx.tickets.find_ticket(id).await? else {
        return Ok(StepOutcome::degraded(
            false,
            "ticket disappeared before notification",
        ));
    };

    let body = format!("A new ticket is assigned to you: {}", ticket.title);
    match ctx
        .notifier
        .send(&user.email, NOTIFICATION_SUBJECT, &body)
        .await
    {
        Ok(()) => Ok(StepOutcome::Ok(true)),
        Err(err) => Ok(StepOutcome::degraded(
            false,
            format!("notification not delivered: {err}"),
        )),
    }
}

async fn persist(
    ctx: &AppContext,
    id: &TicketId,
    update: TicketUpdate,
) -> AppResult<StepOutcome<Ticket>> {
    Ok(match ctx.tickets.update_ticket(id, update).await? {
        Some(ticket) => StepOutcome::Ok(ticket),
        None => not_found(id),
    })
}

fn not_found<T>(id: &TicketId) -> StepOutcome<T> {
    StepOutcome::NonRetriable(AppError::TicketNotFound(id.to_string()).to_string())
}
