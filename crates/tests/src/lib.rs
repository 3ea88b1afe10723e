//! # Integration Tests
//!
//! End-to-end tests for the job engine.
//!
//! Responsibilities:
//! - Full submit -> poll -> persist flow over generated WAV fixtures
//! - Lifecycle/state-machine properties (monotonic status, bounded latency)
//! - Partial-failure and skip semantics through the real orchestrator

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use async_trait::async_trait;
    use bytes::Bytes;
    use serde_json::json;
    use tempfile::TempDir;

    use contracts::{
        AnalysisStage, Category, ContractError, EngineBlueprint, GraphQuery, InputResource,
        JobId, JobMetadata, JobStatus, StagePayload,
    };
    use jobs::{job_queue, Dispatcher, JobStore, StatusReader, WorkerPool};
    use orchestrator::Orchestrator;
    use persistence::{AnalysisSink, GraphStore, RecordStore};
    use stages::{build_registry, ListeningModel, ResonanceEvaluator};

    const VIBE_DESCRIPTORS: [&str; 5] = [
        "Anthemic Joy (Aligned)",
        "Dark/Depressive (Aligned)",
        "Bittersweet / Melancholy (High Dissonance)",
        "Angsty Banger (High Dissonance)",
        "Neutral / Ambiguous",
    ];

    /// Fully wired engine over temp storage.
    struct TestEngine {
        dir: TempDir,
        store: Arc<JobStore>,
        records: Arc<RecordStore>,
        graph: Arc<GraphStore>,
        status: StatusReader,
        dispatcher: Option<Dispatcher>,
        pool: WorkerPool,
    }

    impl TestEngine {
        fn start(workers: usize) -> Self {
            let blueprint = EngineBlueprint::default();
            let graph = Arc::new(GraphStore::new());
            let model = Arc::new(ListeningModel::load(&blueprint.listening));
            let registry = build_registry(
                &blueprint,
                model,
                Arc::clone(&graph) as Arc<dyn GraphQuery>,
            );
            Self::start_with_registry(registry, graph, workers)
        }

        fn start_with_registry(
            registry: Vec<Arc<dyn AnalysisStage>>,
            graph: Arc<GraphStore>,
            workers: usize,
        ) -> Self {
            let dir = TempDir::new().unwrap();
            let records = Arc::new(RecordStore::open(dir.path().join("totality.db")).unwrap());
            let pipeline = Arc::new(Orchestrator::new(
                registry,
                ResonanceEvaluator::new(25.0, 5.0),
            ));

            let store = Arc::new(JobStore::new());
            let (queue_tx, queue_rx) = job_queue();
            let dispatcher = Dispatcher::new(
                Arc::clone(&store),
                queue_tx,
                dir.path().join("temp_uploads"),
            )
            .unwrap();

            let sink_records = Arc::clone(&records);
            let sink_graph = Arc::clone(&graph);
            let pool = WorkerPool::spawn(
                workers,
                queue_rx,
                Arc::clone(&store),
                pipeline,
                move |worker_id| {
                    AnalysisSink::new(
                        format!("worker-{worker_id}"),
                        Arc::clone(&sink_records),
                        Some(Arc::clone(&sink_graph)),
                    )
                },
            );

            Self {
                status: StatusReader::new(Arc::clone(&store)),
                store,
                records,
                graph,
                dispatcher: Some(dispatcher),
                pool,
                dir,
            }
        }

        fn dispatcher(&self) -> &Dispatcher {
            self.dispatcher.as_ref().unwrap()
        }

        async fn shutdown(mut self) -> TempDir {
            self.dispatcher.take();
            self.pool.shutdown().await;
            self.dir
        }

        async fn wait_terminal(&self, job_id: &JobId) -> JobStatus {
            let deadline = Instant::now() + Duration::from_secs(30);
            loop {
                let view = self.status.status(job_id).unwrap();
                if view.status.is_terminal() {
                    return view.status;
                }
                assert!(Instant::now() < deadline, "job never finished");
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        }
    }

    /// 16-bit mono sine fixture as raw WAV bytes.
    fn sine_wav_bytes(freq: f32, secs: f32) -> Bytes {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 22050,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = std::io::Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            let total = (secs * 22050.0) as usize;
            for i in 0..total {
                let t = i as f32 / 22050.0;
                let amp = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.6;
                writer.write_sample((amp * i16::MAX as f32) as i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        Bytes::from(cursor.into_inner())
    }

    fn metadata(lyrics: Option<&str>, markets: &[&str]) -> JobMetadata {
        JobMetadata {
            artist_id: "artist-e2e".to_string(),
            platform: "Spotify".to_string(),
            target_markets: markets.iter().map(|m| m.to_string()).collect(),
            lyrics: lyrics.map(str::to_string),
        }
    }

    /// Scenario: happy lyrics + short audio fixture + two markets.
    #[tokio::test]
    async fn test_e2e_submit_poll_complete() {
        let engine = TestEngine::start(2);

        let id = engine
            .dispatcher()
            .submit(
                sine_wav_bytes(440.0, 1.0),
                "happy_track.wav",
                metadata(Some("I am so happy and joyful today!"), &["US", "UK"]),
            )
            .await
            .unwrap();

        // Submission returns queued immediately
        let view = engine.status.status(&id).unwrap();
        assert!(matches!(
            view.status,
            JobStatus::Queued | JobStatus::Processing | JobStatus::Completed
        ));

        assert_eq!(engine.wait_terminal(&id).await, JobStatus::Completed);

        let view = engine.status.status(&id).unwrap();
        let result = view.result.expect("completed job carries its result");

        // Resonance ran: both prerequisites were available
        let resonance = result.payload(Category::Resonance).unwrap();
        assert_eq!(resonance.get("status"), Some(&json!("success")));
        let dissonance = result.dissonance_score().unwrap();
        assert!((0.0..=1.0).contains(&dissonance));
        assert!(VIBE_DESCRIPTORS.contains(&result.vibe_descriptor().unwrap()));
        assert_eq!(result.lyrical_sentiment(), Some("POSITIVE"));

        // Audio + metadata categories populated
        let creative = result.payload(Category::Creative).unwrap();
        assert!(creative.contains_key("tempo"));
        assert!(creative.contains_key("embedding"));
        assert!(creative.contains_key("sentiment"));
        assert!(result.payload(Category::Market).is_some());
        assert!(result.payload(Category::Culture).is_some());

        // Durable row + graph mirror + temp cleanup
        assert_eq!(engine.records.count().unwrap(), 1);
        assert!(engine.graph.node_count() >= 3);

        let dir = engine.shutdown().await;
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("temp_uploads"))
            .unwrap()
            .collect();
        assert!(leftovers.is_empty(), "temp resource not cleaned up");
    }

    /// Scenario: empty lyrics skip the lyric-dependent and resonance stages.
    #[tokio::test]
    async fn test_e2e_empty_lyrics_skips_lyric_stages() {
        let engine = TestEngine::start(1);

        let id = engine
            .dispatcher()
            .submit(
                sine_wav_bytes(330.0, 1.0),
                "instrumental.wav",
                metadata(Some("   "), &[]),
            )
            .await
            .unwrap();

        assert_eq!(engine.wait_terminal(&id).await, JobStatus::Completed);
        let result = engine.status.status(&id).unwrap().result.unwrap();

        // Audio-only categories still populated
        let creative = result.payload(Category::Creative).unwrap();
        assert!(creative.contains_key("tempo"));
        assert!(creative.contains_key("embedding"));

        // Skips leave no error trace
        assert!(!creative.contains_key("sentiment"));
        assert!(!creative.contains_key("errors"));
        assert!(result.category(Category::Market).is_none());
        assert!(result.category(Category::Culture).is_none());

        // Resonance reports the neutral default
        let resonance = result.payload(Category::Resonance).unwrap();
        assert_eq!(resonance.get("status"), Some(&json!("skipped")));
        assert_eq!(resonance.get("vibe"), Some(&json!("Neutral")));

        engine.shutdown().await;
    }

    /// Scenario: history returns exactly the completed jobs, newest first.
    #[tokio::test]
    async fn test_e2e_history_ordering() {
        let engine = TestEngine::start(1);

        let first = engine
            .dispatcher()
            .submit(sine_wav_bytes(220.0, 0.5), "first.wav", metadata(None, &[]))
            .await
            .unwrap();
        engine.wait_terminal(&first).await;

        let second = engine
            .dispatcher()
            .submit(sine_wav_bytes(440.0, 0.5), "second.wav", metadata(None, &[]))
            .await
            .unwrap();
        engine.wait_terminal(&second).await;

        let entries = engine.records.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "second.wav");
        assert_eq!(entries[1].filename, "first.wav");

        // Never more than the requested limit
        assert_eq!(engine.records.recent(1).unwrap().len(), 1);

        engine.shutdown().await;
    }

    struct SlowStage;

    #[async_trait]
    impl AnalysisStage for SlowStage {
        fn name(&self) -> &str {
            "slow"
        }

        fn category(&self) -> Category {
            Category::Audience
        }

        async fn run(
            &self,
            _input: &InputResource,
            _metadata: &JobMetadata,
        ) -> Result<StagePayload, ContractError> {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Ok(StagePayload::new())
        }
    }

    /// Submission latency is bounded by the upload copy, not analysis time.
    #[tokio::test]
    async fn test_submission_latency_independent_of_analysis() {
        let graph = Arc::new(GraphStore::new());
        let engine = TestEngine::start_with_registry(vec![Arc::new(SlowStage)], graph, 1);

        let started = Instant::now();
        let id = engine
            .dispatcher()
            .submit(sine_wav_bytes(440.0, 1.0), "slow.wav", metadata(None, &[]))
            .await
            .unwrap();
        let latency = started.elapsed();

        assert!(
            latency < Duration::from_secs(2),
            "submission took {latency:?} despite a multi-second pipeline"
        );

        assert_eq!(engine.wait_terminal(&id).await, JobStatus::Completed);
        engine.shutdown().await;
    }

    /// Status transitions are monotonic and terminal states are stable.
    #[tokio::test]
    async fn test_status_transitions_monotonic() {
        fn rank(status: JobStatus) -> u8 {
            match status {
                JobStatus::Queued => 0,
                JobStatus::Processing => 1,
                JobStatus::Completed | JobStatus::Failed => 2,
            }
        }

        let engine = TestEngine::start(1);
        let id = engine
            .dispatcher()
            .submit(sine_wav_bytes(440.0, 1.0), "mono.wav", metadata(None, &[]))
            .await
            .unwrap();

        let mut last = 0u8;
        loop {
            let status = engine.status.status(&id).unwrap().status;
            let current = rank(status);
            assert!(current >= last, "status went backward: {status}");
            last = current;
            if status.is_terminal() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Terminal state is stable under repeated polling
        let terminal = engine.status.status(&id).unwrap().status;
        for _ in 0..10 {
            assert_eq!(engine.status.status(&id).unwrap().status, terminal);
        }

        engine.shutdown().await;
    }

    struct FailingStage;

    #[async_trait]
    impl AnalysisStage for FailingStage {
        fn name(&self) -> &str {
            "failing"
        }

        fn category(&self) -> Category {
            Category::Market
        }

        async fn run(
            &self,
            _input: &InputResource,
            _metadata: &JobMetadata,
        ) -> Result<StagePayload, ContractError> {
            Err(ContractError::stage_failed("failing", "synthetic failure"))
        }
    }

    /// A failing stage degrades its category only; the job still completes.
    #[tokio::test]
    async fn test_e2e_partial_failure() {
        let blueprint = EngineBlueprint::default();
        let graph = Arc::new(GraphStore::new());
        let model = Arc::new(ListeningModel::load(&blueprint.listening));
        let mut registry = build_registry(
            &blueprint,
            model,
            Arc::clone(&graph) as Arc<dyn GraphQuery>,
        );
        registry.push(Arc::new(FailingStage));

        let engine = TestEngine::start_with_registry(registry, graph, 1);
        let id = engine
            .dispatcher()
            .submit(
                sine_wav_bytes(440.0, 1.0),
                "degraded.wav",
                metadata(Some("happy"), &["US"]),
            )
            .await
            .unwrap();

        assert_eq!(engine.wait_terminal(&id).await, JobStatus::Completed);
        let result = engine.status.status(&id).unwrap().result.unwrap();

        // The failing stage shares the market category with the real stage:
        // the successful payload survives with a per-stage error trace
        let market = result.payload(Category::Market).unwrap();
        assert!(market.contains_key("geopolitical_risks"));
        let errors = market.get("errors").unwrap().as_object().unwrap();
        assert_eq!(errors.get("failing"), Some(&json!("synthetic failure")));

        // Every other category is unaffected
        assert!(result.payload(Category::Creative).is_some());
        assert!(result.payload(Category::Audience).is_some());

        engine.shutdown().await;
    }

    /// Bad uploads are rejected synchronously; no job is created.
    #[tokio::test]
    async fn test_unsupported_upload_rejected() {
        let engine = TestEngine::start(1);

        let err = engine
            .dispatcher()
            .submit(
                Bytes::from_static(b"not audio"),
                "notes.txt",
                metadata(None, &[]),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ContractError::UnsupportedMedia { .. }));
        assert!(engine.store.is_empty());
        engine.shutdown().await;
    }

    /// Completed jobs grow the artist's centrality for later submissions.
    #[tokio::test]
    async fn test_graph_feedback_across_jobs() {
        let engine = TestEngine::start(1);

        let first = engine
            .dispatcher()
            .submit(sine_wav_bytes(440.0, 0.5), "a.wav", metadata(None, &[]))
            .await
            .unwrap();
        engine.wait_terminal(&first).await;

        let second = engine
            .dispatcher()
            .submit(sine_wav_bytes(220.0, 0.5), "b.wav", metadata(None, &[]))
            .await
            .unwrap();
        engine.wait_terminal(&second).await;

        let result = engine.status.status(&second).unwrap().result.unwrap();
        let industry = result.payload(Category::Industry).unwrap();
        // The first job's mirror is visible by the time the second runs
        assert!(industry.get("artist_centrality").unwrap().as_f64().unwrap() > 0.0);

        engine.shutdown().await;
    }
}
