pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";
pub const DEFAULT_EMBEDDING_BATCH_SIZE: usize = 512;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

pub const DEFAULT_SOURCE_URL: &str = "https://ja.wikipedia.org/wiki/LangChain";
pub const DEFAULT_SELECTOR: &str = "body";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("chatrag/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 0;
pub const DEFAULT_TOP_K: usize = 3;

/// Phrase the answer template tells the model to reply with when the context
/// does not hold the answer.
pub const REFUSAL_PHRASE: &str = "わかりません";

pub const DEFAULT_SYSTEM_TEMPLATE: &str = "# 指示
以下の質問に回答してください。質問に対する情報がコンテキストによって提供されない場合、または明確な情報源が存在しない場合は、『わかりません』とだけ回答してください。推測や創作はしないでください。

質問に対する情報が見つからない場合、必ず『わかりません』と回答してください。例えば、以下の質問に対してコンテキストに情報が含まれない場合です。

質問：「少年ジャンプで掲載されていた『ナルト』について教えて

# コンテキスト
{context}
";

pub const DEFAULT_QUERY_TRANSFORM: &str = "上記の会話を踏まえ、会話に関連する情報を得るための検索クエリを生成してください。クエリのみを回答し、それ以外のことは書かないでください。";
