use async_trait::async_trait;
use tracing::{info, instrument};

use crate::pipeline::state::{GenerationState, InputKind, InputPayload, SourceTree, StageKind};
use crate::pipeline::{Stage, StageContext};
use crate::source::decode_zip;
use crate::types::{Result, ScribeError};

/// Resolves the input descriptor into a [`SourceTree`]
pub struct FetchStage;

#[async_trait]
impl Stage for FetchStage {
    fn kind(&self) -> StageKind {
        StageKind::Fetch
    }

    #[instrument(skip_all, fields(kind = %state.input.kind))]
    async fn run(&self, mut state: GenerationState, ctx: &StageContext) -> Result<GenerationState> {
        let sources = match (state.input.kind, &state.input.payload) {
            (InputKind::Github, InputPayload::Locator(locator)) => {
                info!(locator = %locator, source = ctx.source.name(), "Fetching remote repository");
                let files = ctx
                    .source
                    .fetch(locator, state.input.branch.as_deref())
                    .await?;
                SourceTree::Memory(files)
            }
            (InputKind::Zip, InputPayload::Archive(bytes)) => {
                SourceTree::Memory(decode_zip(bytes, ctx.walker.max_file_size())?)
            }
            (InputKind::Upload, InputPayload::Files(files)) => SourceTree::Memory(files.clone()),
            (InputKind::Local, InputPayload::Directory(path)) => {
                if !path.is_dir() {
                    return Err(ScribeError::MissingContent(format!(
                        "{} is not a directory",
                        path.display()
                    )));
                }
                SourceTree::Disk(path.clone())
            }
            (kind, payload) => {
                return Err(ScribeError::UnsupportedInput(format!(
                    "{} input cannot carry a {} payload",
                    kind,
                    payload.describe()
                )));
            }
        };

        if let SourceTree::Memory(files) = &sources {
            info!(files = files.len(), "Fetched sources");
        }
        state.sources = Some(sources);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::RepositoryWalker;
    use crate::pipeline::stages::testing::{StubSource, offline_context};
    use crate::pipeline::state::{InputDescriptor, Preferences};
    use std::collections::BTreeMap;
    use std::io::Write;
    use std::sync::Arc;

    fn state_for(input: InputDescriptor) -> GenerationState {
        GenerationState::new(input, Preferences::default())
    }

    #[tokio::test]
    async fn test_upload_passes_through() {
        let files = BTreeMap::from([("a.py".to_string(), "x = 1".to_string())]);
        let state = FetchStage
            .run(state_for(InputDescriptor::upload(files.clone())), &offline_context())
            .await
            .unwrap();
        assert!(matches!(state.sources, Some(SourceTree::Memory(ref m)) if *m == files));
    }

    #[tokio::test]
    async fn test_github_uses_remote_source() {
        let mut ctx = offline_context();
        ctx.source = Arc::new(StubSource {
            files: BTreeMap::from([("lib.rs".to_string(), "fn main() {}".to_string())]),
        });
        let state = FetchStage
            .run(state_for(InputDescriptor::github("acme/widgets", None)), &ctx)
            .await
            .unwrap();
        match state.sources {
            Some(SourceTree::Memory(files)) => assert!(files.contains_key("lib.rs")),
            other => panic!("unexpected sources: {:?}", other),
        }
    }

    fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for (name, data) in entries {
                writer
                    .start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(data).unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[tokio::test]
    async fn test_zip_is_decoded() {
        let bytes = zip_of(&[("src/app.py", b"def run(): pass")]);
        let state = FetchStage
            .run(state_for(InputDescriptor::zip(bytes)), &offline_context())
            .await
            .unwrap();
        match state.sources {
            Some(SourceTree::Memory(files)) => assert_eq!(files["src/app.py"], "def run(): pass"),
            other => panic!("unexpected sources: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_zip_entries_respect_max_file_size() {
        let padding = vec![b' '; 512];
        let bytes = zip_of(&[("pad.py", &padding), ("ok.py", b"x = 1")]);
        let mut ctx = offline_context();
        ctx.walker = RepositoryWalker::new().with_max_file_size(128);
        let state = FetchStage
            .run(state_for(InputDescriptor::zip(bytes)), &ctx)
            .await
            .unwrap();
        match state.sources {
            Some(SourceTree::Memory(files)) => {
                assert_eq!(files.keys().collect::<Vec<_>>(), vec!["ok.py"])
            }
            other => panic!("unexpected sources: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_mismatched_payload_is_unsupported() {
        let input = InputDescriptor::new(InputKind::Zip, InputPayload::Locator("acme/x".into()));
        let err = FetchStage
            .run(state_for(input), &offline_context())
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::UnsupportedInput(_)));
    }

    #[tokio::test]
    async fn test_local_requires_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = FetchStage
            .run(state_for(InputDescriptor::local(dir.path())), &offline_context())
            .await
            .unwrap();
        assert!(matches!(state.sources, Some(SourceTree::Disk(_))));

        let missing = dir.path().join("nope");
        let err = FetchStage
            .run(state_for(InputDescriptor::local(missing)), &offline_context())
            .await
            .unwrap_err();
        assert!(matches!(err, ScribeError::MissingContent(_)));
    }
}
