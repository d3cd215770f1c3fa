use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use jobmon_model::{InstanceId, JobName, Params, TRANSCRIPT_PARAM};
use tracing::{debug, info};

use crate::{error::CoreError, fs, templates::TemplateStore};

mod meta;
use meta::InstanceMeta;

mod render;
pub use render::render;

/// File extension of rendered instance configurations.
pub const INSTANCE_EXT: &str = "conf";
/// File extension of instance transcripts.
pub const TRANSCRIPT_EXT: &str = "log";
const META_SUFFIX: &str = "meta.json";

/// One materialized instance on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRef {
    pub job: JobName,
    pub id: InstanceId,
    /// Rendered configuration handed to the supervisor.
    pub config_path: PathBuf,
    /// Ordering stamp: persisted creation time, or the file mtime for instances without metadata.
    pub created_at_ns: u64,
}

/// Creates and enumerates job instances.
///
/// An instance of job `name` with id `id` is stored as `<instances_dir>/<name>_<id>.conf`,
/// its transcript is `<transcripts_dir>/<name>_<id>.log`.
#[derive(Debug)]
pub struct InstanceRegistry {
    instances_dir: PathBuf,
    transcripts_dir: PathBuf,
    last_stamp: AtomicU64,
}

impl InstanceRegistry {
    pub fn new(instances_dir: impl Into<PathBuf>, transcripts_dir: impl Into<PathBuf>) -> Self {
        Self {
            instances_dir: instances_dir.into(),
            transcripts_dir: transcripts_dir.into(),
            last_stamp: AtomicU64::new(0),
        }
    }

    pub fn instances_dir(&self) -> &Path {
        &self.instances_dir
    }

    pub fn instance_path(&self, job: &JobName, id: &InstanceId) -> PathBuf {
        self.instances_dir
            .join(format!("{}.{INSTANCE_EXT}", stem(job, id)))
    }

    pub fn transcript_path(&self, job: &JobName, id: &InstanceId) -> PathBuf {
        self.transcripts_dir
            .join(format!("{}.{TRANSCRIPT_EXT}", stem(job, id)))
    }

    fn meta_path(&self, job: &JobName, id: &InstanceId) -> PathBuf {
        self.instances_dir
            .join(format!("{}.{META_SUFFIX}", stem(job, id)))
    }

    /// Render the template of `job` with `params` into a fresh instance and return its id.
    ///
    /// The transcript path is injected as `$transcript_file`, overriding a caller-supplied value.
    pub async fn render_and_create(
        &self,
        templates: &TemplateStore,
        job: &JobName,
        params: &Params,
    ) -> Result<InstanceId, CoreError> {
        let id = InstanceId::generate();
        let template = templates.fetch(job).await?;

        let mut params = params.clone();
        let transcript = self.transcript_path(job, &id);
        params.insert(
            TRANSCRIPT_PARAM.to_string(),
            transcript.to_string_lossy().into_owned(),
        );
        let rendered = render(&template, &params);

        let config_path = self.persist(job, &id, &rendered).await?;

        info!(target: "jobmon.core", %job, %id, path = %config_path.display(), "instance created");
        Ok(id)
    }

    /// Write the metadata sidecar, then the rendered config.
    ///
    /// The sidecar is removed again if the config cannot be written, so no orphan is left.
    async fn persist(
        &self,
        job: &JobName,
        id: &InstanceId,
        rendered: &str,
    ) -> Result<PathBuf, CoreError> {
        fs::ensure_dir(&self.instances_dir).await?;

        let meta = InstanceMeta {
            job: job.clone(),
            id: id.clone(),
            created_at_ns: self.next_stamp(),
        };
        let meta_path = self.meta_path(job, id);
        let meta_bytes = serde_json::to_vec(&meta)
            .map_err(|e| CoreError::io(&meta_path)(std::io::Error::other(e)))?;
        fs::write_atomic(&meta_path, &meta_bytes).await?;

        let config_path = self.instance_path(job, id);
        if let Err(e) = fs::write_atomic(&config_path, rendered.as_bytes()).await {
            let _ = tokio::fs::remove_file(&meta_path).await;
            return Err(e);
        }
        Ok(config_path)
    }

    /// All instances of `job`, newest first.
    ///
    /// Only entries named exactly `<job>_<id>.conf` with a well-formed id match,
    /// so `job` never picks up instances of `job2` or `job_a`.
    pub async fn list_instances(&self, job: &JobName) -> Result<Vec<InstanceRef>, CoreError> {
        let mut found = Vec::new();
        for path in fs::list_dir(&self.instances_dir).await? {
            let Ok(id) = extract_instance_id(job, &path) else {
                continue;
            };
            if !fs::is_file(&path).await? {
                continue;
            }
            let created_at_ns = match InstanceMeta::load(&self.meta_path(job, &id)).await {
                Some(meta) if meta.id == id && &meta.job == job => meta.created_at_ns,
                _ => fs::mtime_ns(&path).await,
            };
            found.push(InstanceRef {
                job: job.clone(),
                id,
                config_path: path,
                created_at_ns,
            });
        }
        found.sort_by(|a, b| {
            b.created_at_ns
                .cmp(&a.created_at_ns)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(found)
    }

    /// Most recently created instance of `job`.
    pub async fn latest_instance(&self, job: &JobName) -> Result<Option<InstanceRef>, CoreError> {
        let latest = self.list_instances(job).await?.into_iter().next();
        debug!(target: "jobmon.core", %job, latest = ?latest.as_ref().map(|i| i.id.as_str()), "latest instance lookup");
        Ok(latest)
    }

    pub async fn exists_instance(&self, job: &JobName, id: &InstanceId) -> Result<bool, CoreError> {
        fs::is_file(&self.instance_path(job, id)).await
    }

    /// Next creation stamp: wall-clock nanoseconds, bumped to stay strictly increasing.
    fn next_stamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(0);

        let mut prev = self.last_stamp.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev.saturating_add(1));
            match self.last_stamp.compare_exchange_weak(
                prev,
                next,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Parse the instance id back out of an instance storage key of `job`.
pub fn extract_instance_id(job: &JobName, path: &Path) -> Result<InstanceId, CoreError> {
    let unrecognized = || CoreError::UnrecognizedInstance {
        job: job.clone(),
        path: path.to_path_buf(),
    };

    if path.extension().and_then(|e| e.to_str()) != Some(INSTANCE_EXT) {
        return Err(unrecognized());
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .and_then(|s| s.strip_prefix(job.as_str()))
        .and_then(|s| s.strip_prefix('_'))
        .filter(|s| InstanceId::is_valid(s))
        .map(InstanceId::parse)
        .transpose()?
        .ok_or_else(unrecognized)
}

fn stem(job: &JobName, id: &InstanceId) -> String {
    format!("{job}_{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(name: &str) -> JobName {
        JobName::new(name).unwrap()
    }

    fn id(s: &str) -> InstanceId {
        InstanceId::parse(s).unwrap()
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        templates: TemplateStore,
        registry: InstanceRegistry,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let templates = TemplateStore::new(dir.path().join("templates"));
        let registry =
            InstanceRegistry::new(dir.path().join("instances"), dir.path().join("logs"));
        Fixture {
            _dir: dir,
            templates,
            registry,
        }
    }

    #[test]
    fn paths_are_deterministic() {
        let registry = InstanceRegistry::new("/srv/instances", "/var/log/jobs");
        let (j, i) = (job("backup"), id("0123456789ab"));

        assert_eq!(
            registry.instance_path(&j, &i),
            PathBuf::from("/srv/instances/backup_0123456789ab.conf")
        );
        assert_eq!(
            registry.transcript_path(&j, &i),
            PathBuf::from("/var/log/jobs/backup_0123456789ab.log")
        );
    }

    #[test]
    fn extract_inverts_instance_path() {
        let registry = InstanceRegistry::new("/srv/instances", "/tmp");
        for name in ["backup", "etl_v2", "a.b-c"] {
            let j = job(name);
            let i = InstanceId::generate();
            let path = registry.instance_path(&j, &i);
            assert_eq!(extract_instance_id(&j, &path).unwrap(), i);
        }
    }

    #[test]
    fn extract_rejects_foreign_keys() {
        let j = job("job");
        for path in [
            "/i/job2_0123456789ab.conf",
            "/i/job_a_0123456789ab.conf",
            "/i/job_0123456789ab.log",
            "/i/job_0123456789ab.meta.json",
            "/i/job_xyz.conf",
            "/i/job.conf",
        ] {
            let err = extract_instance_id(&j, Path::new(path)).unwrap_err();
            assert!(matches!(err, CoreError::UnrecognizedInstance { .. }), "{path}");
        }
    }

    #[tokio::test]
    async fn render_and_create_injects_transcript() {
        let f = fixture();
        let j = job("backup");
        f.templates
            .register(&j, b"cmd=run --x=$x\ntranscript=$transcript_file")
            .await
            .unwrap();

        let params = Params::from([("x".to_string(), "5".to_string())]);
        let i = f.registry.render_and_create(&f.templates, &j, &params).await.unwrap();

        let rendered = std::fs::read_to_string(f.registry.instance_path(&j, &i)).unwrap();
        let transcript = f.registry.transcript_path(&j, &i);
        assert!(rendered.contains("cmd=run --x=5"));
        assert!(rendered.contains(&format!("transcript={}", transcript.display())));
    }

    #[tokio::test]
    async fn injected_transcript_overrides_caller() {
        let f = fixture();
        let j = job("backup");
        f.templates.register(&j, b"log=$transcript_file").await.unwrap();

        let params = Params::from([(TRANSCRIPT_PARAM.to_string(), "/evil".to_string())]);
        let i = f.registry.render_and_create(&f.templates, &j, &params).await.unwrap();

        let rendered = std::fs::read_to_string(f.registry.instance_path(&j, &i)).unwrap();
        assert!(!rendered.contains("/evil"));
    }

    #[tokio::test]
    async fn two_renders_yield_distinct_instances() {
        let f = fixture();
        let j = job("backup");
        f.templates.register(&j, b"x=$x").await.unwrap();
        let params = Params::new();

        let a = f.registry.render_and_create(&f.templates, &j, &params).await.unwrap();
        let b = f.registry.render_and_create(&f.templates, &j, &params).await.unwrap();

        assert_ne!(a, b);
        assert_ne!(f.registry.transcript_path(&j, &a), f.registry.transcript_path(&j, &b));
        assert_eq!(f.registry.list_instances(&j).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn render_without_template_is_not_found() {
        let f = fixture();
        let err = f
            .registry
            .render_and_create(&f.templates, &job("ghost"), &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::TemplateNotFound(_)));
        assert!(f.registry.list_instances(&job("ghost")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_instance_is_the_newest() {
        let f = fixture();
        let j = job("backup");
        f.templates.register(&j, b"").await.unwrap();

        assert!(f.registry.latest_instance(&j).await.unwrap().is_none());

        let mut last = None;
        for _ in 0..5 {
            last = Some(f.registry.render_and_create(&f.templates, &j, &Params::new()).await.unwrap());
        }
        let latest = f.registry.latest_instance(&j).await.unwrap().unwrap();
        assert_eq!(Some(latest.id), last);
    }

    #[tokio::test]
    async fn latest_instance_ignores_longer_names() {
        let f = fixture();
        let (short, long, underscored) = (job("job"), job("job2"), job("job_a"));
        for j in [&short, &long, &underscored] {
            f.templates.register(j, b"").await.unwrap();
        }

        let own = f.registry.render_and_create(&f.templates, &short, &Params::new()).await.unwrap();
        f.registry.render_and_create(&f.templates, &long, &Params::new()).await.unwrap();
        f.registry.render_and_create(&f.templates, &underscored, &Params::new()).await.unwrap();

        let all = f.registry.list_instances(&short).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, own);
    }

    #[tokio::test]
    async fn instances_without_metadata_fall_back_to_mtime() {
        let f = fixture();
        let j = job("legacy");
        std::fs::create_dir_all(f.registry.instances_dir()).unwrap();
        let i = id("aaaaaaaaaaaa");
        std::fs::write(f.registry.instance_path(&j, &i), "cmd=old").unwrap();

        let latest = f.registry.latest_instance(&j).await.unwrap().unwrap();
        assert_eq!(latest.id, i);
        assert!(latest.created_at_ns > 0);
    }

    #[tokio::test]
    async fn exists_instance_checks_storage() {
        let f = fixture();
        let j = job("backup");
        f.templates.register(&j, b"").await.unwrap();
        let i = f.registry.render_and_create(&f.templates, &j, &Params::new()).await.unwrap();

        assert!(f.registry.exists_instance(&j, &i).await.unwrap());
        assert!(!f.registry.exists_instance(&j, &id("000000000000")).await.unwrap());
    }

    #[tokio::test]
    async fn failed_config_write_leaves_no_sidecar() {
        let f = fixture();
        let (j, i) = (job("backup"), id("0123456789ab"));

        // A non-empty directory squatting on the config path makes the rename fail.
        let config = f.registry.instance_path(&j, &i);
        std::fs::create_dir_all(config.join("blocker")).unwrap();

        let err = f.registry.persist(&j, &i, "cmd=run").await.unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
        assert!(!f.registry.meta_path(&j, &i).exists());
    }

    #[test]
    fn stamps_strictly_increase() {
        let registry = InstanceRegistry::new("/i", "/t");
        let a = registry.next_stamp();
        let b = registry.next_stamp();
        let c = registry.next_stamp();
        assert!(a < b && b < c);
    }
}
