//! Work closures for every [`Request`]. Each runs on a worker thread, catches
//! its own failures, and reports only through the task's [`UiPoster`].

use rp_base::types::Contents;
use rp_base::{BatchError, LogSink};
use rp_mod_github::batch::{self, UploadOutcome};

use super::actions::Request;
use super::dispatch::{Dispatcher, Scope, TaskId};
use super::messages::UiEvent;
use crate::state::{State, token_store};

/// Queue the work for `request`. Returns None when it needs a session and
/// nobody is logged in.
pub fn dispatch(dispatcher: &mut Dispatcher, state: &mut State, request: Request) -> Option<TaskId> {
    if let Request::Login { token, save_token } = request {
        let backend = state.backend.clone();
        let token_path = state.settings.token_path();
        let label = format!("Login ({})", backend.label());
        return Some(dispatcher.run(label, Scope::Account, move |ctx| {
            let authenticated = backend.connect(&token).and_then(|host| host.authenticate().map(|id| (host, id)));
            match authenticated {
                Ok((host, identity)) => {
                    if let Err(e) = token_store::persist(&token_path, &token, save_token) {
                        ctx.ui.warn(format!("Could not update the token file: {}", e));
                    }
                    ctx.ui.success(format!("Logged in as {}", identity));
                    ctx.ui.post(UiEvent::LoggedIn { identity, host });
                }
                Err(e) => {
                    ctx.ui.error(format!("Login failed: {}", e));
                    ctx.ui.post(UiEvent::LoginFailed);
                }
            }
        }));
    }

    let host = match state.session.host() {
        Ok(host) => host,
        Err(e) => {
            tracing::warn!(?request, "request without a session");
            state.logs.push(rp_base::LogEntry::new(rp_base::LogLevel::Warning, e.to_string()));
            return None;
        }
    };

    let id = match request {
        // Dispatched above, before the session check
        Request::Login { .. } => return None,

        Request::ListRepositories => dispatcher.run("Load repositories", Scope::Account, move |ctx| {
            match host.list_repositories() {
                Ok(repos) => {
                    ctx.ui.info(format!("Loaded {} repositories", repos.len()));
                    ctx.ui.post(UiEvent::Repositories(repos));
                }
                Err(e) => ctx.ui.error(format!("Could not load repositories: {}", e)),
            }
        }),

        Request::Browse { repository, path, generation } => {
            let scope = Scope::path(&repository, &path);
            dispatcher.run(format!("List {}", display(&repository, &path)), scope, move |ctx| {
                match host.get_contents(&repository, &path) {
                    Ok(Contents::Directory(entries)) => {
                        ctx.ui.post(UiEvent::Listing { repository, path, generation, entries })
                    }
                    Ok(Contents::File(file)) => {
                        ctx.ui.post(UiEvent::Listing { repository, path, generation, entries: vec![file.entry] })
                    }
                    Err(e) => ctx.ui.error(format!("Could not list {}: {}", display(&repository, &path), e)),
                }
            })
        }

        Request::OpenFile { repository, entry } => {
            let scope = Scope::path(&repository, &entry.path);
            dispatcher.run(format!("Open {}", entry.path), scope, move |ctx| {
                match host.get_contents(&repository, &entry.path) {
                    Ok(Contents::File(file)) => {
                        let content = file.decode();
                        if content.is_binary() {
                            ctx.ui.warn(format!("{} is not UTF-8 text; opened read-only", entry.path));
                        }
                        ctx.ui.post(UiEvent::FileOpened { repository, entry: file.entry, content });
                    }
                    Ok(Contents::Directory(_)) => ctx.ui.error(format!("{} is a directory", entry.path)),
                    Err(e) => ctx.ui.error(format!("Could not open {}: {}", entry.path, e)),
                }
            })
        }

        Request::Save { repository, entry, content } => {
            let scope = Scope::path(&repository, &entry.path);
            dispatcher.run(format!("Save {}", entry.path), scope, move |ctx| {
                match batch::save_file(host.as_ref(), &repository, &entry.path, &content, &entry.sha) {
                    Ok(()) => {
                        ctx.ui.success(format!("Saved {}", entry.path));
                        ctx.ui.post(UiEvent::FileSaved { repository, path: entry.path });
                    }
                    Err(e) => ctx.ui.error(format!("Could not save {}: {}", entry.path, e)),
                }
            })
        }

        Request::DeletePath { repository, entry } => {
            let scope = Scope::path(&repository, &entry.path);
            dispatcher.run(format!("Delete {}", entry.path), scope, move |ctx| {
                match batch::delete_path(host.as_ref(), &repository, &entry, &ctx.cancel, &ctx.ui) {
                    Ok(report) if report.skipped > 0 => ctx.ui.warn(format!(
                        "Deleted {} file(s) under {}, {} skipped",
                        report.deleted, entry.path, report.skipped
                    )),
                    Ok(report) => ctx.ui.success(format!("Deleted {} file(s) under {}", report.deleted, entry.path)),
                    Err(e) => report_batch_error(&ctx.ui, &format!("Delete of {}", entry.path), "deletion(s)", &e),
                }
                ctx.ui.post(UiEvent::ContentsChanged { repository });
            })
        }

        Request::DeleteRepository(repository) => {
            let scope = Scope::Repository(repository.clone());
            dispatcher.run(format!("Delete repository {}", repository), scope, move |ctx| {
                match host.delete_repository(&repository) {
                    Ok(()) => {
                        ctx.ui.success(format!("Deleted repository {}", repository));
                        ctx.ui.post(UiEvent::RepositoryDeleted(repository));
                    }
                    Err(e) => ctx.ui.error(format!("Could not delete {}: {}", repository, e)),
                }
            })
        }

        Request::CreateRepository(spec) => {
            dispatcher.run(format!("Create repository {}", spec.name), Scope::Account, move |ctx| {
                match batch::create_repository(host.as_ref(), &spec) {
                    Ok(summary) => {
                        ctx.ui.success(format!("Created repository {}", summary.full_name));
                        ctx.ui.post(UiEvent::RepositoryCreated(summary));
                    }
                    Err(e) => ctx.ui.error(format!("Could not create {}: {}", spec.name, e)),
                }
            })
        }

        Request::UploadFile { repository, local, remote } => {
            let scope = Scope::path(&repository, &remote);
            dispatcher.run(format!("Upload {}", remote), scope, move |ctx| {
                match batch::upload_file(host.as_ref(), &repository, &local, &remote) {
                    Ok(UploadOutcome::Created) => ctx.ui.success(format!("Created {}", remote)),
                    Ok(UploadOutcome::Updated) => ctx.ui.success(format!("Updated {}", remote)),
                    Err(e) => ctx.ui.error(format!("Could not upload {}: {}", local.display(), e)),
                }
                ctx.ui.post(UiEvent::ContentsChanged { repository });
            })
        }

        Request::UploadFolder { repository, local, remote, respect_gitignore } => {
            let scope = Scope::path(&repository, &remote);
            let label = format!("Upload folder {}", local.display());
            dispatcher.run(label, scope, move |ctx| {
                let result =
                    batch::upload_folder(host.as_ref(), &repository, &local, &remote, respect_gitignore, &ctx.cancel, &ctx.ui);
                match result {
                    Ok(report) if report.skipped > 0 => ctx.ui.warn(format!(
                        "Uploaded {} file(s) to {}, {} skipped",
                        report.uploaded,
                        display(&repository, &remote),
                        report.skipped
                    )),
                    Ok(report) => ctx
                        .ui
                        .success(format!("Uploaded {} file(s) to {}", report.uploaded, display(&repository, &remote))),
                    Err(e) => report_batch_error(&ctx.ui, &format!("Upload of {}", local.display()), "upload(s)", &e),
                }
                ctx.ui.post(UiEvent::ContentsChanged { repository });
            })
        }

        Request::DownloadArchive { repository, format, dest } => {
            let scope = Scope::Repository(repository.clone());
            dispatcher.run(format!("Download {}", repository), scope, move |ctx| {
                match batch::download_archive(host.as_ref(), &repository, format, &dest) {
                    Ok(bytes) => ctx.ui.success(format!("Saved {} ({} bytes) to {}", repository, bytes, dest.display())),
                    Err(e) => ctx.ui.error(format!("Could not download {}: {}", repository, e)),
                }
            })
        }
    };
    Some(id)
}

fn report_batch_error(ui: &dyn LogSink, what: &str, unit: &str, error: &BatchError) {
    match error {
        BatchError::Cancelled { completed } => ui.warn(format!("{} cancelled after {} {}", what, completed, unit)),
        BatchError::Aborted { completed, source } => {
            ui.error(format!("{} stopped after {} {}: {}", what, completed, unit, source))
        }
    }
}

fn display(repository: &str, path: &str) -> String {
    if path.is_empty() { repository.to_string() } else { format!("{}/{}", repository, path) }
}
