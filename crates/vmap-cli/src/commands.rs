use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, info_span, warn};

use vmap_cli::inputs::{read_direct_mapping, read_mapping, subject_values, unassigned_sources};
use vmap_cli::render::{group_text, outcome_text, progress_text};
use vmap_client::ApiClient;
use vmap_map::evaluate::{evaluate, fold_group, gate_passes};
use vmap_map::{EditorError, JobEvent, LookupQuery, MappingEditor, ProgressTracker};
use vmap_model::Mapping;

use crate::cli::{
    ApplyArgs, CheckArgs, DeleteArgs, EvalArgs, LookupArgs, PushArgs, PushDirectArgs, ReviewArgs,
    ShowArgs,
};
use crate::summary::{print_lookup, print_mapping, print_mapping_list, print_report, print_review};

pub fn run_skeleton() -> Result<()> {
    let json = Mapping::new().to_wire().to_json_pretty()?;
    println!("{json}");
    Ok(())
}

/// Returns whether the mapping failed the check.
pub fn run_check(args: &CheckArgs) -> Result<bool> {
    let mapping = read_mapping(&args.file)?;
    let report = mapping.validate();
    print_report(&report);
    Ok(report.has_errors() || (args.strict && report.warning_count() > 0))
}

pub fn run_eval(args: &EvalArgs) -> Result<()> {
    let mapping = read_mapping(&args.file)?;
    let values = subject_values(&args.values);
    let _span = info_span!("eval", mapping_target = %mapping.target.label()).entered();
    for label in unassigned_sources(&mapping, &values) {
        warn!(variable = %label, "no value given; treated as missing");
    }

    for (index, group) in mapping.groups().iter().enumerate() {
        let value = fold_group(group, &values);
        let gate = if gate_passes(group, &value) { "pass" } else { "fail" };
        println!("group {}: {} => {value} [{gate}]", index + 1, group_text(group));
    }
    let outcome = evaluate(&mapping, &values);
    debug!(?outcome, "evaluated");
    println!("{}", outcome_text(&mapping, &outcome));
    Ok(())
}

pub async fn run_show(client: &ApiClient, args: &ShowArgs) -> Result<()> {
    let data = client
        .get_mapping(args.id)
        .await
        .with_context(|| format!("fetch mapping {}", args.id))?;
    if args.json {
        println!("{}", data.to_json_pretty()?);
    } else {
        print_mapping(&Mapping::from_wire(&data));
    }
    Ok(())
}

pub async fn run_push(client: &ApiClient, args: &PushArgs) -> Result<()> {
    let mapping = read_mapping(&args.file)?;
    let mut editor = MappingEditor::with_mapping(mapping);
    let result = if args.no_check {
        editor.save(client).await
    } else {
        editor.save_checked(client).await
    };
    if let Err(error) = result {
        if matches!(error, EditorError::Invalid { .. }) {
            print_report(&editor.validate());
        }
        return Err(editor_failure(&editor, &error));
    }
    if let Some(feedback) = editor.feedback() {
        println!("{}", feedback.message);
    }
    if let Some(id) = editor.mapping().id {
        println!("Mapping id: {id}");
    }
    if let Some(next) = editor.next_location() {
        info!(next, "server redirect");
    }
    Ok(())
}

pub async fn run_push_direct(client: &ApiClient, args: &PushDirectArgs) -> Result<()> {
    let data = read_direct_mapping(&args.file)?;
    let id = client
        .save_direct_mapping(&data)
        .await
        .context("save direct mapping")?;
    println!("Mapping id: {id}");
    Ok(())
}

pub async fn run_review(client: &ApiClient, args: &ReviewArgs) -> Result<()> {
    let mut mapping = Mapping::new();
    mapping.id = Some(args.id);
    let mut editor = MappingEditor::with_mapping(mapping);

    editor
        .refresh_review(client)
        .await
        .map_err(|e| editor_failure(&editor, &e))?;
    if let Some(status) = args.status {
        editor
            .update_status(client, status)
            .await
            .map_err(|e| editor_failure(&editor, &e))?;
    }
    if let Some(notes) = &args.notes {
        editor
            .update_notes(client, notes)
            .await
            .map_err(|e| editor_failure(&editor, &e))?;
    }
    if let Some(record) = editor.review() {
        print_review(record);
    }
    Ok(())
}

pub async fn run_list(client: &ApiClient) -> Result<()> {
    let list = client.list_mappings().await.context("list mappings")?;
    print_mapping_list(&list);
    Ok(())
}

pub async fn run_delete(client: &ApiClient, args: &DeleteArgs) -> Result<()> {
    client
        .delete_mappings(&args.ids)
        .await
        .map_err(|e| anyhow!(e.user_message().to_string()))?;
    println!("Deleted {} mapping(s).", args.ids.len());
    Ok(())
}

pub async fn run_lookup(client: &ApiClient, args: &LookupArgs) -> Result<()> {
    let query = LookupQuery {
        vocabulary: args.vocabulary,
        term: args.term.trim().to_string(),
        schema: args.schema.clone(),
        attribute: args.attribute.clone(),
        is_target: args.target.then_some(true),
    };
    let results = client.lookup(&query).await.context("lookup")?;
    print_lookup(&results);
    Ok(())
}

pub async fn run_apply(client: &ApiClient, args: &ApplyArgs) -> Result<()> {
    let kind = args.kind();
    client
        .start_apply_job(kind)
        .await
        .with_context(|| format!("start {kind} apply job"))?;
    println!("Mappings in progress.");
    if !args.watch {
        return Ok(());
    }

    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "  Applying: [{bar:40}] {pos}/{len} ({percent}%)",
    )?);

    let mut tracker = ProgressTracker::new();
    let mut events = std::pin::pin!(client.progress_events(kind));
    while let Some(event) = events.next().await {
        let event = event.context("progress channel")?;
        if let JobEvent::Message(message) = &event {
            bar.println(message.to_string());
        }
        if tracker.apply(event) {
            let progress = tracker.progress();
            bar.set_length(progress.total);
            bar.set_position(progress.count);
        }
        if tracker.is_complete() {
            break;
        }
    }
    bar.finish_and_clear();
    println!("{}", progress_text(tracker.progress()));
    Ok(())
}

/// The editor's feedback line is what a user of the form would have seen.
fn editor_failure(editor: &MappingEditor, error: &EditorError) -> anyhow::Error {
    debug!(%error, "editor operation failed");
    let message = editor
        .feedback()
        .map_or_else(|| error.user_message(), |feedback| feedback.message.clone());
    anyhow!(message)
}
