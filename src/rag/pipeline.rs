// Question pipeline: retrieve -> compose -> record, plus document ingestion
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{Config, CorpusConfig};
use crate::corpus::{document_to_chunks, extract_text, validate_document_path};
use crate::embedding::{Embedder, MiniLmEmbedder};
use crate::errors::{LoanQaError, Result};
use crate::generation::{GeminiClient, GenerationClient};
use crate::index::{IndexBuilder, VectorIndex};
use crate::rag::composer::{Answer, AnswerComposer};
use crate::rag::retrieval::{Retriever, SearchParams};
use crate::session::{ChatSession, Exchange};

/// Progress points reported while answering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskStage {
    Retrieving,
    Generating,
}

/// Outcome of one answered question
#[derive(Debug, Clone)]
pub struct TurnResult {
    /// Position of the completed turn in the session
    pub position: usize,
    pub answer: Answer,
    /// Passages the answer was composed from
    pub context: Vec<String>,
}

/// Outcome of merging an uploaded document into a session
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub document: String,
    pub path: PathBuf,
    pub chunks: usize,
    /// Size of the session's private index after merging
    pub index_size: usize,
}

/// Loan question answering over a shared base index
pub struct LoanAssistant {
    base_index: Arc<VectorIndex>,
    retriever: Retriever,
    composer: AnswerComposer,
    corpus: CorpusConfig,
    batch_size: usize,
}

impl LoanAssistant {
    /// Assemble from already constructed parts
    pub fn new(
        base_index: Arc<VectorIndex>,
        embedder: Arc<dyn Embedder>,
        client: Arc<dyn GenerationClient>,
        config: &Config,
    ) -> Result<Self> {
        if base_index.model_id() != embedder.model_id() {
            return Err(LoanQaError::IndexModelMismatch {
                expected: embedder.model_id().to_string(),
                found: base_index.model_id().to_string(),
            });
        }
        if base_index.dimension() != embedder.dimension() {
            return Err(LoanQaError::InvalidConfig(format!(
                "index dimension {} does not match embedder dimension {}",
                base_index.dimension(),
                embedder.dimension()
            )));
        }

        Ok(Self {
            base_index,
            retriever: Retriever::new(embedder, SearchParams::from(&config.retrieval)),
            composer: AnswerComposer::new(
                client,
                config.generation.language.clone(),
                config.session.history_turns,
            ),
            corpus: config.corpus.clone(),
            batch_size: config.embedding.batch_size,
        })
    }

    /// Build the production assistant
    ///
    /// The credential is checked before anything slow happens, then the
    /// index and model are loaded, then connectivity is verified.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let client = GeminiClient::from_env(&config.generation)?;
        let index = VectorIndex::load(&config.index.path, &config.embedding.model_id)?;
        let embedder = MiniLmEmbedder::from_hub(&config.embedding.model_id)?;

        if config.generation.verify_on_connect {
            client.verify().await?;
        }

        Self::new(Arc::new(index), Arc::new(embedder), Arc::new(client), config)
    }

    /// The session's private index if it has one, else the base index
    pub fn active_index<'a>(&'a self, session: &'a ChatSession) -> &'a VectorIndex {
        session.private_index().unwrap_or(self.base_index.as_ref())
    }

    /// Retrieve up to `k` passages for `question` from the session's index
    pub fn retrieve(&self, session: &ChatSession, question: &str, k: usize) -> Result<Vec<String>> {
        self.retriever
            .retrieve_top_k(self.active_index(session), question, k)
    }

    /// Answer `question` with the configured `top_k`
    pub async fn ask(&self, session: &mut ChatSession, question: &str) -> Result<TurnResult> {
        let k = self.retriever.params().top_k;
        self.ask_top_k(session, question, k).await
    }

    /// Answer `question` and record the turn on `session`
    ///
    /// The turn is pending while the answer is produced. If no answer can
    /// be produced at all, the pending turn is removed again.
    pub async fn ask_top_k(&self, session: &mut ChatSession, question: &str, k: usize) -> Result<TurnResult> {
        self.ask_observed(session, question, k, |_| {}).await
    }

    /// [`ask_top_k`](Self::ask_top_k), reporting each stage to `on_stage`
    pub async fn ask_observed<F>(
        &self,
        session: &mut ChatSession,
        question: &str,
        k: usize,
        on_stage: F,
    ) -> Result<TurnResult>
    where
        F: Fn(AskStage) + Send + Sync,
    {
        let question = question.trim();
        if question.is_empty() {
            return Err(LoanQaError::InvalidInput("question is empty".to_string()));
        }

        session.begin_turn(question)?;

        let answered = self.answer(session, question, k, &on_stage).await;
        let (answer, context) = match answered {
            Ok(done) => done,
            Err(e) => {
                session.abandon_pending();
                return Err(e);
            }
        };

        let position = session.complete_turn(answer.text.clone(), context.clone())?;
        Ok(TurnResult {
            position,
            answer,
            context,
        })
    }

    async fn answer<F>(
        &self,
        session: &ChatSession,
        question: &str,
        k: usize,
        on_stage: &F,
    ) -> Result<(Answer, Vec<String>)>
    where
        F: Fn(AskStage) + Send + Sync,
    {
        on_stage(AskStage::Retrieving);
        let context = self.retrieve(session, question, k)?;
        on_stage(AskStage::Generating);
        let history: Vec<Exchange> = session
            .memory()
            .recent(self.composer.history_turns())
            .into_iter()
            .cloned()
            .collect();
        let answer = self.composer.compose(question, &context, &history).await?;
        Ok((answer, context))
    }

    /// Embed a PDF or text document into the session's private index
    ///
    /// The path is validated before any extraction or embedding happens.
    pub fn ingest_document(&self, session: &mut ChatSession, path: &Path) -> Result<IngestReport> {
        validate_document_path(path)?;

        let document = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let text = extract_text(path)?;
        if text.trim().is_empty() {
            return Err(LoanQaError::InvalidInput(format!(
                "no text could be extracted from {}",
                document
            )));
        }

        let texts: Vec<String> = document_to_chunks(
            &document,
            &text,
            self.corpus.document_chunking,
            self.corpus.chunk_size,
        )
        .into_iter()
        .map(|c| c.text)
        .collect();

        let additions = IndexBuilder::new(self.retriever.embedder().as_ref(), self.batch_size)
            .embed_texts(&texts)?;
        let index_size = session.augment_index(&self.base_index, document.clone(), &additions)?;

        tracing::info!(
            session = %session.id(),
            document = %document,
            chunks = texts.len(),
            index_size,
            "document ingested"
        );

        Ok(IngestReport {
            document,
            path: path.to_path_buf(),
            chunks: texts.len(),
            index_size,
        })
    }

    pub fn base_index(&self) -> &VectorIndex {
        &self.base_index
    }

    pub fn search_params(&self) -> &SearchParams {
        self.retriever.params()
    }

    pub fn composer(&self) -> &AnswerComposer {
        &self.composer
    }

    /// Change the answer language for subsequent prompts
    pub fn set_language(&mut self, language: impl Into<String>) {
        self.composer.set_language(language);
    }

    pub fn language(&self) -> &str {
        self.composer.language()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::composer::{AnswerOutcome, APOLOGY_MESSAGE};
    use crate::rag::prompt::PromptStrategy;
    use crate::test_support::{KeywordEmbedder, ScriptedClient};
    use std::fs;
    use tempfile::TempDir;

    const CREDIT: &str = "A good credit history increases your chances of loan approval.";

    fn base_index(embedder: &KeywordEmbedder) -> VectorIndex {
        let texts = [
            CREDIT,
            "Self employed applicants must submit two years of tax returns.",
            "Property area is recorded as Urban, Semiurban or Rural.",
        ];
        let mut index = VectorIndex::new(embedder.model_id(), embedder.dimension());
        for text in texts {
            index.add(text, embedder.embed(text).unwrap()).unwrap();
        }
        index
    }

    fn assistant(client: Arc<ScriptedClient>) -> LoanAssistant {
        let embedder = Arc::new(KeywordEmbedder::new());
        let index = Arc::new(base_index(&embedder));
        LoanAssistant::new(index, embedder, client, &Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_ask_records_turn_and_context() {
        let client = Arc::new(ScriptedClient::answering("  Keep a clean **credit history**.  "));
        let assistant = assistant(client.clone());
        let mut session = ChatSession::new();

        let question = "What increases the chances of getting a home loan?";
        let result = assistant.ask_top_k(&mut session, question, 3).await.unwrap();

        assert_eq!(result.position, 0);
        assert!(result.context.contains(&CREDIT.to_string()));
        assert_eq!(result.answer.text, "Keep a clean **credit history**.");
        assert_eq!(result.answer.strategy, PromptStrategy::Grounded);

        let prompts = client.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(CREDIT));
        assert!(prompts[0].contains(question));

        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.context_for(0), Some(result.context.as_slice()));
        assert_eq!(session.memory().len(), 1);
    }

    #[tokio::test]
    async fn test_language_switch_applies_to_next_prompt() {
        let client = Arc::new(ScriptedClient::answering("ok"));
        let mut assistant = assistant(client.clone());
        let mut session = ChatSession::new();

        assistant.ask(&mut session, "credit history").await.unwrap();
        assistant.set_language("Hindi");
        assistant.ask(&mut session, "credit history").await.unwrap();

        let prompts = client.prompts();
        assert!(prompts[0].contains("Respond in English"));
        assert!(prompts[1].contains("Respond in Hindi"));
        assert_eq!(assistant.language(), "Hindi");
    }

    #[tokio::test]
    async fn test_stages_reported_in_order() {
        let assistant = assistant(Arc::new(ScriptedClient::answering("ok")));
        let mut session = ChatSession::new();
        let stages = std::sync::Mutex::new(Vec::new());

        assistant
            .ask_observed(&mut session, "credit history", 2, |stage| {
                stages.lock().unwrap().push(stage);
            })
            .await
            .unwrap();
        assert_eq!(
            stages.into_inner().unwrap(),
            vec![AskStage::Retrieving, AskStage::Generating]
        );
    }

    #[tokio::test]
    async fn test_transient_failure_records_apology() {
        let client = Arc::new(ScriptedClient::new(vec![Err(LoanQaError::Generation(
            "HTTP 503: overloaded".to_string(),
        ))]));
        let assistant = assistant(client);
        let mut session = ChatSession::new();

        let result = assistant.ask(&mut session, "Is credit history important?").await.unwrap();
        assert_eq!(result.answer.outcome, AnswerOutcome::Fallback { error_code: "GENERATION_FAILED" });
        assert_eq!(session.turns()[0].answer_text(), APOLOGY_MESSAGE);
        assert_eq!(session.turns().len(), session.contexts().len());
    }

    #[tokio::test]
    async fn test_configuration_failure_abandons_turn() {
        let client = Arc::new(ScriptedClient::new(vec![Err(LoanQaError::CredentialRejected {
            status: 401,
            message: "bad key".to_string(),
        })]));
        let assistant = assistant(client);
        let mut session = ChatSession::new();

        assert!(assistant.ask(&mut session, "anything").await.is_err());
        assert!(session.turns().is_empty());
        assert!(session.pending().is_none());
    }

    #[tokio::test]
    async fn test_blank_question_rejected() {
        let assistant = assistant(Arc::new(ScriptedClient::answering("x")));
        let mut session = ChatSession::new();
        let err = assistant.ask(&mut session, "   ").await.unwrap_err();
        assert!(matches!(err, LoanQaError::InvalidInput(_)));
        assert!(session.turns().is_empty());
    }

    #[test]
    fn test_model_mismatch_rejected() {
        let embedder = Arc::new(KeywordEmbedder::new());
        let index = Arc::new(VectorIndex::new("other-model", embedder.dimension()));
        let client = Arc::new(ScriptedClient::answering("x"));
        assert!(LoanAssistant::new(index, embedder, client, &Config::default()).is_err());
    }

    #[test]
    fn test_ingest_text_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("policy.txt");
        fs::write(&path, "Gold loans are approved against pledged jewellery within a day.").unwrap();

        let assistant = assistant(Arc::new(ScriptedClient::answering("x")));
        let mut session = ChatSession::new();
        let report = assistant.ingest_document(&mut session, &path).unwrap();

        assert_eq!(report.document, "policy.txt");
        assert_eq!(report.chunks, 1);
        assert_eq!(report.index_size, 4);
        assert_eq!(assistant.base_index().len(), 3);

        let hits = assistant.retrieve(&session, "gold loans jewellery", 1).unwrap();
        assert!(hits[0].starts_with("Gold loans"));
        let other = ChatSession::new();
        assert_eq!(assistant.active_index(&other).len(), 3);
    }

    #[test]
    fn test_ingest_rejects_bad_extension_before_reading() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scan.docx");
        fs::write(&path, "content").unwrap();

        let assistant = assistant(Arc::new(ScriptedClient::answering("x")));
        let mut session = ChatSession::new();
        let err = assistant.ingest_document(&mut session, &path).unwrap_err();
        assert!(matches!(err, LoanQaError::UnsupportedFileType { .. }));
        assert!(session.private_index().is_none());
    }

    #[test]
    fn test_ingest_rejects_empty_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        fs::write(&path, "   \n").unwrap();

        let assistant = assistant(Arc::new(ScriptedClient::answering("x")));
        let mut session = ChatSession::new();
        assert!(matches!(
            assistant.ingest_document(&mut session, &path),
            Err(LoanQaError::InvalidInput(_))
        ));
    }
}
