//! Engine-level configuration: the behavioural flags that aren't a
//! connection string or pool size (those live in `tokenvault-store`'s
//! `DbConfig`/`WorkerPoolConfig`) but do change `Tokenize`/`Detokenize`
//! semantics. `tokenvault-cli` is responsible for loading these from
//! environment variables at process start (§6.5).

/// Behavioural knobs for a running `Engine` (§5, §7, §9).
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// When the write-through queue is unreachable, allow `tokenize` to
    /// still succeed as long as the cache write-through succeeded,
    /// returning a degraded-but-successful response instead of
    /// `PERSIST_UNAVAILABLE` (§4.4 `PERSIST_DEGRADED`, §5). Defaults to
    /// `false`: without an explicit opt-in, a request that cannot be made
    /// durable fails fast rather than silently accepting a durability gap.
    pub cache_only_write_through: bool,
    /// §9 Open Question escape hatch: preserve the pre-rewrite behaviour of
    /// distinguishing "not found" from "failed to decrypt" externally.
    /// Defaults to `false` (the collapsed, oracle-resistant behaviour this
    /// spec requires); flipping this to `true` is a deliberate deployment
    /// decision recorded in `DESIGN.md`, never a silent fallback.
    pub preserve_decrypt_oracle: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { cache_only_write_through: false, preserve_decrypt_oracle: false }
    }
}
