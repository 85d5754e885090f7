//! Output rendering for the report commands

use serde::Serialize;
use std::io::Write;
use wr_client::{CommonProblemsReport, RequestDetails, WardReport};
use wr_core::Page;
use wr_model::{AnalysisEntry, Document, FlatProblemRow, IssueTag, Request, User, Ward};

/// Output format selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    Text,
    Json,
}

fn json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

fn labels(issues: impl IntoIterator<Item = impl std::borrow::Borrow<IssueTag>>) -> String {
    issues
        .into_iter()
        .map(|i| i.borrow().as_str().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn ward_label(ward: Option<&Ward>) -> String {
    ward.map_or_else(|| Ward::not_provided().to_string(), ToString::to_string)
}

pub(crate) fn common<W: Write>(out: &mut W, format: Format, report: &CommonProblemsReport) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, &serde_json::json!({ "title": report.title, "groups": report.groups }));
    }
    writeln!(out, "{}", report.title)?;
    for group in &report.groups {
        writeln!(
            out,
            "{:<8} {:>4}  {}  [{}]",
            group.key,
            group.count(),
            group.summary,
            labels(&group.issues)
        )?;
    }
    Ok(())
}

pub(crate) fn wards<W: Write>(out: &mut W, format: Format, report: &WardReport) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, &report.groups);
    }
    for group in &report.groups {
        writeln!(
            out,
            "{:<10} ward {:<14} {:<10} {:>4}  {}  [{}]",
            group.ward_id,
            group.ward,
            group.category,
            group.count(),
            group.summary,
            labels(&group.issues)
        )?;
    }
    Ok(())
}

pub(crate) fn analysis<W: Write>(out: &mut W, format: Format, entries: &[AnalysisEntry]) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, entries);
    }
    for entry in entries {
        let slices: Vec<String> = entry
            .category
            .iter()
            .map(|c| format!("{} {}", c.issue, c.problem_count))
            .collect();
        writeln!(
            out,
            "ward {:<14} {:>4}  {}",
            entry.ward,
            entry.total_problems,
            slices.join(", ")
        )?;
    }
    Ok(())
}

pub(crate) fn page<W: Write>(out: &mut W, format: Format, title: &str, page: &Page<FlatProblemRow>) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, page);
    }
    writeln!(
        out,
        "{title}: page {}/{}, {} rows",
        page.page,
        page.total_pages.max(1),
        page.total_rows
    )?;
    for row in &page.rows {
        writeln!(
            out,
            "  {:<10} {:<20} ward {:<14} {:<14} {}  [{}]",
            row.problem_id,
            row.name,
            ward_label(row.ward.as_ref()),
            row.phone_number.as_deref().unwrap_or("-"),
            row.description,
            labels(&row.category)
        )?;
    }
    Ok(())
}

pub(crate) fn requests<W: Write>(out: &mut W, format: Format, requests: &[Request]) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, requests);
    }
    for request in requests {
        writeln!(
            out,
            "{:<26} {:<12} {:>5} docs  {}",
            request.id, request.status, request.doc_count, request.title
        )?;
    }
    Ok(())
}

pub(crate) fn details<W: Write>(out: &mut W, format: Format, details: &RequestDetails) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, details);
    }
    writeln!(out, "{} ({})", details.title, details.status)?;
    writeln!(out, "created by {} at {}", details.created_by, details.created_at)?;
    for document in &details.documents {
        writeln!(
            out,
            "  {:<10} {:<20} ward {:<14} {} problems",
            document.id,
            document.display_name(),
            ward_label(document.ward.as_ref()),
            document.problems.len()
        )?;
    }
    Ok(())
}

pub(crate) fn document<W: Write>(out: &mut W, format: Format, document: &Document) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, document);
    }
    writeln!(
        out,
        "{} ward {} {}",
        document.display_name(),
        ward_label(document.ward.as_ref()),
        document.phone_number.as_deref().unwrap_or("-")
    )?;
    for problem in &document.problems {
        writeln!(
            out,
            "  {:<10} {}  [{}]",
            problem.id,
            problem.description.english,
            labels(&problem.category)
        )?;
    }
    Ok(())
}

pub(crate) fn users<W: Write>(out: &mut W, format: Format, users: &[User]) -> anyhow::Result<()> {
    if format == Format::Json {
        return json(out, users);
    }
    for user in users {
        writeln!(out, "{:<26} {:<20} {}", user.id, user.name, user.email)?;
    }
    Ok(())
}
