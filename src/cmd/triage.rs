use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;

use crate::context::AppContext;
use crate::domain::event::TicketCreated;
use crate::domain::ticket::TicketId;
use crate::error::AppResult;
use crate::workflow::triage::{TriageOutcome, run_triage};

pub async fn process(ctx: &AppContext, ticket_id: String) -> TriageOutcome {
    run_triage(ctx, TicketCreated::new(TicketId(ticket_id))).await
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Reads newline-delimited ticket-created events and triages each ticket in
/// its own task. Lines that are blank or not valid events are skipped.
pub async fn consume<R>(ctx: &AppContext, reader: R) -> AppResult<ConsumeSummary>
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ConsumeSummary::default();
    let mut runs = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let event = match TicketCreated::from_json_line(&line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, %line, "skipping malformed event");
                summary.skipped += 1;
                continue;
            }
        };

        let ctx = ctx.clone();
        runs.spawn(async move { run_triage(&ctx, event).await });
    }

    while let Some(joined) = runs.join_next().await {
        match joined {
            Ok(outcome) => {
                report(&outcome);
                if outcome.success() {
                    summary.succeeded += 1;
                } else {
                    summary.failed += 1;
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "triage task panicked");
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

pub fn report(outcome: &TriageOutcome) {
    match (&outcome.failure, &outcome.assignee) {
        (Some(failure), _) => println!("{}: failed, {failure}", outcome.ticket_id),
        (None, Some(user)) => {
            let notice = if outcome.notified {
                "notified"
            } else {
                "not notified"
            };
            println!("{}: assigned to {} ({notice})", outcome.ticket_id, user.email)
        }
        (None, None) => println!("{}: triaged, no assignee available", outcome.ticket_id),
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use super::*;
    use crate::domain::ticket::TicketStatus;
    use crate::domain::user::Role;
    use crate::testing::Harness;

    #[tokio::test]
    async fn processes_single_ticket() {
        let harness = Harness::new(Some(r#"{"priority":"high"}"#)).await;
        harness.user("mod@example.com", Role::Moderator, &[]).await;
        let ticket = harness.ticket().await;

        let outcome = process(&harness.ctx, ticket.id.to_string()).await;

        assert!(outcome.success());
        assert_eq!(outcome.assignee.unwrap().email, "mod@example.com");
    }

    #[tokio::test]
    async fn consumes_event_stream_concurrently() {
        let harness = Harness::new(None).await;
        harness.user("mod@example.com", Role::Moderator, &[]).await;
        let first = harness.ticket().await;
        let second = harness.ticket().await;

        let input = format!(
            "{{\"ticketId\":\"{}\"}}\n\nnot an event\n{{\"ticketId\":\"{}\"}}\n{{\"ticketId\":\"gone\"}}\n",
            first.id, second.id
        );
        let summary = consume(&harness.ctx, BufReader::new(input.as_bytes()))
            .await
            .unwrap();

        assert_eq!(
            summary,
            ConsumeSummary {
                succeeded: 2,
                failed: 1,
                skipped: 1,
            }
        );
        for id in [&first.id, &second.id] {
            assert_eq!(harness.stored(id).await.status, TicketStatus::InProgress);
        }
        assert_eq!(harness.notifier.sent.lock().unwrap().len(), 2);
    }
}
