use std::sync::Arc;

use crate::chain::{
    DocumentAnswerer, LastMessageRetriever, QueryRewriter, RetrievalChain, TurnAwareRetriever,
};
use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::core::errors::RagError;
use crate::core::logging;
use crate::llm::{ChatModel, EmbeddingModel, OpenAiProvider};
use crate::rag::{
    Document, DocumentLoader, MemoryVectorStore, RecursiveCharacterTextSplitter, Retriever,
    VectorStore, VectorStoreRetriever, WebLoader,
};

/// Shared clients and configuration for one program run.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: AppConfig,
    pub chat: Arc<dyn ChatModel>,
    pub embeddings: Arc<dyn EmbeddingModel>,
    pub loader: Arc<dyn DocumentLoader>,
}

impl AppState {
    pub fn initialize() -> anyhow::Result<Arc<Self>> {
        let paths = Arc::new(AppPaths::new());
        let service = ConfigService::new(paths.clone());
        let config = service.load()?;

        logging::init(&paths, &config.logging);
        tracing::info!("Project root: {}", paths.project_root.display());

        let provider = Arc::new(OpenAiProvider::new(&config.openai)?);
        let loader = Arc::new(WebLoader::new(&config.loader)?);

        Ok(Arc::new(AppState {
            paths,
            config,
            chat: provider.clone(),
            embeddings: provider,
            loader,
        }))
    }

    /// Wire a state from already-built collaborators.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: AppConfig,
        chat: Arc<dyn ChatModel>,
        embeddings: Arc<dyn EmbeddingModel>,
        loader: Arc<dyn DocumentLoader>,
    ) -> Self {
        Self {
            paths,
            config,
            chat,
            embeddings,
            loader,
        }
    }

    pub fn splitter(&self) -> Result<RecursiveCharacterTextSplitter, RagError> {
        RecursiveCharacterTextSplitter::from_config(&self.config.splitter)
    }

    pub async fn load(&self, url: &str) -> Result<Vec<Document>, RagError> {
        self.loader.load(url).await
    }

    /// Load `url`, split it and embed every chunk into a fresh store.
    pub async fn build_store(&self, url: &str) -> Result<Arc<MemoryVectorStore>, RagError> {
        let documents = self.load(url).await?;
        let chunks = self.splitter()?.split_documents(&documents);
        self.index(chunks).await
    }

    pub async fn index(&self, chunks: Vec<Document>) -> Result<Arc<MemoryVectorStore>, RagError> {
        let store = MemoryVectorStore::from_documents(chunks, self.embeddings.clone()).await?;
        tracing::info!("Vector store ready with {} chunk(s)", store.len().await);
        Ok(Arc::new(store))
    }

    pub fn retriever(&self, store: Arc<dyn VectorStore>) -> Arc<dyn Retriever> {
        Arc::new(VectorStoreRetriever::new(store, self.config.retriever.k))
    }

    pub fn answerer(&self) -> DocumentAnswerer {
        DocumentAnswerer::new(self.chat.clone(), self.config.prompts.system_template.clone())
    }

    pub fn query_rewriter(&self) -> QueryRewriter {
        QueryRewriter::new(self.chat.clone(), self.config.prompts.query_transform.clone())
    }

    /// Retrieves with the latest message only.
    pub fn last_message_chain(&self, retriever: Arc<dyn Retriever>) -> RetrievalChain {
        RetrievalChain::new(
            Arc::new(LastMessageRetriever::new(retriever)),
            self.answerer(),
        )
    }

    /// Retrieves with a rewritten query once the conversation has history.
    pub fn conversational_chain(&self, retriever: Arc<dyn Retriever>) -> RetrievalChain {
        RetrievalChain::new(
            Arc::new(TurnAwareRetriever::new(retriever, self.query_rewriter())),
            self.answerer(),
        )
    }
}
