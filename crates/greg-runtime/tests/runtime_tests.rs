#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    use greg_config::{Paths, ProviderKind};
    use greg_core::{GregError, Profile};
    use greg_llm::mock::{CallMode, MockProvider};
    use greg_llm::{Dispatcher, StreamChunk};
    use greg_runtime::session::{drive, NoClipboard};
    use greg_runtime::{
        CommandPipeline, CommandRunner, Confirm, ContextAssembler, Outcome, Phase, Session,
    };
    use greg_safety::DangerRule;

    /// Records every confirmation request and answers with a fixed choice.
    struct ScriptedConfirm {
        answer: bool,
        asked: Mutex<Vec<(String, &'static str)>>,
    }

    impl ScriptedConfirm {
        fn new(answer: bool) -> Self {
            Self {
                answer,
                asked: Mutex::new(Vec::new()),
            }
        }

        fn asked(&self) -> Vec<(String, &'static str)> {
            self.asked.lock().unwrap().clone()
        }
    }

    impl Confirm for ScriptedConfirm {
        fn confirm(&self, command: &str, rule: &DangerRule) -> greg_core::Result<bool> {
            self.asked
                .lock()
                .unwrap()
                .push((command.to_string(), rule.name));
            Ok(self.answer)
        }
    }

    /// Records commands instead of running them.
    #[derive(Default)]
    struct RecordingRunner {
        ran: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &str) -> greg_core::Result<i32> {
            self.ran.lock().unwrap().push(command.to_string());
            Ok(0)
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        paths: Paths,
        workdir: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path().join("config"), dir.path().join(".zsh_history"));
        let workdir = dir.path().join("work");
        std::fs::create_dir_all(&workdir).unwrap();
        std::fs::write(workdir.join("notes.txt"), "hi").unwrap();
        std::fs::write(
            paths.history_file(),
            ": 1700000000:0;git status\n: 1700000001:0;cargo build\n",
        )
        .unwrap();
        Fixture {
            _dir: dir,
            paths,
            workdir,
        }
    }

    fn write_skill(paths: &Paths, name: &str, body: &str) {
        std::fs::create_dir_all(paths.skills_dir()).unwrap();
        std::fs::write(paths.skills_dir().join(format!("{name}.md")), body).unwrap();
    }

    fn pipeline(fx: &Fixture, kind: ProviderKind, mock: Arc<MockProvider>) -> CommandPipeline {
        let dispatcher = Dispatcher::with_provider(kind, mock);
        let context = ContextAssembler::new(&fx.paths, dispatcher.profile()).with_cwd(&fx.workdir);
        CommandPipeline::new(dispatcher, &fx.paths).with_context(context)
    }

    // ── Context ────────────────────────────────────────────────

    #[tokio::test]
    async fn test_context_reads_history_and_listing() {
        let fx = fixture();
        let ctx = ContextAssembler::new(&fx.paths, Profile::Cloud)
            .with_cwd(&fx.workdir)
            .assemble()
            .await;

        assert_eq!(ctx.cwd, fx.workdir.display().to_string());
        assert_eq!(ctx.history, "git status\ncargo build");
        assert!(ctx.dir_listing.contains("notes.txt"));
        assert!(!ctx.os_name.is_empty());
    }

    #[tokio::test]
    async fn test_context_degrades_to_empty_fields() {
        let fx = fixture();
        let paths = Paths::new(fx.paths.config_dir(), fx.workdir.join("missing_history"));
        let ctx = ContextAssembler::new(&paths, Profile::OnDevice)
            .with_cwd(fx.workdir.join("no-such-dir"))
            .assemble()
            .await;

        assert_eq!(ctx.history, "");
        assert_eq!(ctx.dir_listing, "");
    }

    #[tokio::test]
    async fn test_on_device_profile_truncates_listing() {
        let fx = fixture();
        for i in 0..30 {
            std::fs::write(fx.workdir.join(format!("file{i:02}.txt")), "").unwrap();
        }
        let ctx = ContextAssembler::new(&fx.paths, Profile::OnDevice)
            .with_cwd(&fx.workdir)
            .assemble()
            .await;

        let lines: Vec<&str> = ctx.dir_listing.lines().collect();
        assert_eq!(lines.len(), 16);
        assert!(lines[15].starts_with("... ("));
        assert!(lines[15].ends_with(" more)"));
    }

    // ── Command pipeline ───────────────────────────────────────

    #[tokio::test]
    async fn test_list_files_without_skills() {
        let fx = fixture();
        let mock = Arc::new(MockProvider::new("m").with_response("ls -la"));
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, mock.clone());

        let command = pipeline.generate_command("list all files").await.unwrap();
        assert_eq!(command, "ls -la");

        let calls = mock.recorded_requests();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, CallMode::Complete);
        assert_eq!(calls[0].1.user, "list all files");
        assert_eq!(calls[0].1.max_tokens, 1024);
        let system = &calls[0].1.system;
        assert!(system.contains(&format!("Working directory: {}", fx.workdir.display())));
        assert!(!system.contains("ACTIVE SKILLS:"));
        assert!(system.ends_with("Recent command history:\ngit status\ncargo build"));
    }

    #[tokio::test]
    async fn test_selected_skills_are_injected() {
        let fx = fixture();
        write_skill(&fx.paths, "style", "Prefer long flags.");
        write_skill(
            &fx.paths,
            "git",
            "---\ndescription: git commits and branches\n---\nNever force push.",
        );
        let mock = Arc::new(
            MockProvider::new("m")
                .with_response("[\"git\"]")
                .with_response("```bash\ngit log --oneline -5\n```"),
        );
        let pipeline = pipeline(&fx, ProviderKind::OpenAi, mock.clone());

        let command = pipeline.generate_command("last 5 commits").await.unwrap();
        assert_eq!(command, "git log --oneline -5");

        let calls = mock.recorded_requests();
        assert_eq!(calls.len(), 2);
        assert!(calls[1].1.system.ends_with(
            "\n\nACTIVE SKILLS:\n[Skill: git]\nNever force push.\n\n[Skill: style]\nPrefer long flags."
        ));
    }

    #[tokio::test]
    async fn test_generation_reports_applied_skills() {
        let fx = fixture();
        write_skill(&fx.paths, "style", "Prefer long flags.");
        write_skill(
            &fx.paths,
            "git",
            "---\ndescription: git commits and branches\n---\nNever force push.",
        );
        let mock = Arc::new(
            MockProvider::new("m")
                .with_response("[\"git\"]")
                .with_response("git log --oneline -5"),
        );
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, mock);

        let generation = pipeline.generate("last 5 commits").await.unwrap();
        assert_eq!(generation.command, "git log --oneline -5");
        assert_eq!(generation.skills, vec!["git".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_selection_still_generates() {
        let fx = fixture();
        write_skill(
            &fx.paths,
            "docker",
            "---\ndescription: docker containers\n---\nUse compose v2.",
        );
        let mock = Arc::new(
            MockProvider::new("m")
                .with_error("error sending request: connection refused")
                .with_response("docker ps"),
        );
        let pipeline = pipeline(&fx, ProviderKind::Gemini, mock.clone());

        let command = pipeline.generate_command("show running docker containers").await.unwrap();
        assert_eq!(command, "docker ps");
        assert!(mock.recorded_requests()[1].1.system.contains("[Skill: docker]"));
    }

    #[tokio::test]
    async fn test_on_device_makes_a_single_call() {
        let fx = fixture();
        write_skill(&fx.paths, "git", "---\ndescription: git\n---\nBe careful.");
        let mock = Arc::new(MockProvider::new("m").with_response("git status"));
        let pipeline = pipeline(&fx, ProviderKind::OnDevice, mock.clone());

        pipeline.generate_command("git state").await.unwrap();
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let fx = fixture();
        let mock = Arc::new(MockProvider::new("m").with_response("```\n```"));
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, mock);

        let err = pipeline.generate_command("anything").await.unwrap_err();
        assert!(matches!(err, GregError::EmptyGeneration));
    }

    #[tokio::test]
    async fn test_provider_error_propagates() {
        let fx = fixture();
        let mock = Arc::new(MockProvider::new("m").with_error("invalid x-api-key"));
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, mock);

        let err = pipeline.generate_command("anything").await.unwrap_err();
        assert_eq!(err.to_string(), "invalid x-api-key");
        assert!(err.needs_reconfiguration());
    }

    // ── Confirmation ───────────────────────────────────────────

    #[tokio::test]
    async fn test_declined_dangerous_command_never_runs() {
        let fx = fixture();
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, Arc::new(MockProvider::new("m")));
        let confirm = ScriptedConfirm::new(false);
        let runner = RecordingRunner::default();

        let outcome = pipeline
            .execute("rm -rf /tmp/x", &confirm, &runner)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Declined);
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(confirm.asked(), vec![("rm -rf /tmp/x".to_string(), "rm")]);
        assert!(runner.ran.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_accepted_dangerous_command_runs() {
        let fx = fixture();
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, Arc::new(MockProvider::new("m")));
        let confirm = ScriptedConfirm::new(true);
        let runner = RecordingRunner::default();

        let outcome = pipeline
            .execute("git push origin main", &confirm, &runner)
            .await
            .unwrap();

        assert_eq!(outcome, Outcome::Executed(0));
        assert_eq!(*runner.ran.lock().unwrap(), vec!["git push origin main".to_string()]);
    }

    #[tokio::test]
    async fn test_safe_command_skips_confirmation() {
        let fx = fixture();
        let pipeline = pipeline(&fx, ProviderKind::Anthropic, Arc::new(MockProvider::new("m")));
        let confirm = ScriptedConfirm::new(false);
        let runner = RecordingRunner::default();

        let outcome = pipeline.execute("ls -la | grep txt", &confirm, &runner).await.unwrap();

        assert_eq!(outcome, Outcome::Executed(0));
        assert!(confirm.asked().is_empty());
        assert_eq!(runner.ran.lock().unwrap().len(), 1);
    }

    // ── Session streaming ──────────────────────────────────────

    #[tokio::test]
    async fn test_drive_streams_into_session() {
        let mock = Arc::new(MockProvider::new("m").with_chunks(vec![
            StreamChunk::Reasoning("weighing options".into()),
            StreamChunk::Content("Use ".into()),
            StreamChunk::Content("`du -sh`.".into()),
            StreamChunk::Done,
        ]));
        let dispatcher = Dispatcher::with_provider(ProviderKind::Anthropic, mock.clone());
        let mut session = Session::new(Box::new(NoClipboard));
        session.show();
        session.edit_input("how big is this folder");
        let pending = session.submit().unwrap();

        let mut seen = Vec::new();
        drive(&dispatcher, &mut session, &pending, |chunk, _| seen.push(chunk.clone())).await;

        assert_eq!(seen.len(), 4);
        assert_eq!(session.phase(), Phase::Done);
        assert_eq!(session.state().response, "Use `du -sh`.");
        assert_eq!(session.state().reasoning, "weighing options");
        assert!(!session.state().is_loading);

        let calls = mock.recorded_requests();
        assert_eq!(calls[0].0, CallMode::Stream);
        assert_eq!(calls[0].1.max_tokens, 4096);
        assert_eq!(calls[0].1.user, "how big is this folder");
    }

    #[tokio::test]
    async fn test_drive_records_stream_error() {
        let mock = Arc::new(MockProvider::new("m").with_error("HTTP 500: upstream"));
        let dispatcher = Dispatcher::with_provider(ProviderKind::OpenAi, mock);
        let mut session = Session::new(Box::new(NoClipboard));
        session.show();
        session.edit_input("hello");
        let pending = session.submit().unwrap();

        drive(&dispatcher, &mut session, &pending, |_, _| {}).await;

        assert_eq!(session.phase(), Phase::Error);
        assert_eq!(session.state().error_message.as_deref(), Some("HTTP 500: upstream"));
    }

    #[tokio::test]
    async fn test_drive_treats_closed_channel_as_done() {
        let mock = Arc::new(
            MockProvider::new("m").with_chunks(vec![StreamChunk::Content("partial".into())]),
        );
        let dispatcher = Dispatcher::with_provider(ProviderKind::Gemini, mock);
        let mut session = Session::new(Box::new(NoClipboard));
        session.show();
        session.edit_input("hello");
        let pending = session.submit().unwrap();

        drive(&dispatcher, &mut session, &pending, |_, _| {}).await;

        assert_eq!(session.phase(), Phase::Done);
        assert_eq!(session.state().response, "partial");
    }
}
