//! ユーザーが抑制した (読み, 表記) の集合
//!
//! 書き込みは単一のプロデューサースレッドが次の手順で行います。
//!
//! ```text
//! lock() → { add_entry() | clear() }* → unlock()
//! ```
//!
//! ロック中、コンシューマー側の問い合わせは集合が空であるかのように振る舞い、
//! 決してブロックしません。読み出しは公開済みの不変スナップショットに対して行われ、
//! `unlock()`で新しいスナップショットが公開されます。

use std::sync::{Arc, Mutex, RwLock, TryLockError};

use hashbrown::HashSet;

/// 公開される不変のスナップショット
#[derive(Clone, Debug, Default)]
struct Snapshot {
    entries: HashSet<String>,
    has_key_empty: bool,
    has_value_empty: bool,
}

impl Snapshot {
    #[inline(always)]
    fn entry_key(key: &str, value: &str) -> String {
        let mut s = String::with_capacity(key.len() + value.len() + 1);
        s.push_str(key);
        s.push('\t');
        s.push_str(value);
        s
    }

    fn suppress(&self, key: &str, value: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        if self.has_key_empty && self.entries.contains(&Self::entry_key("", value)) {
            return true;
        }
        if self.has_value_empty && self.entries.contains(&Self::entry_key(key, "")) {
            return true;
        }
        self.entries.contains(&Self::entry_key(key, value))
    }
}

/// 抑制辞書
///
/// プロデューサー1スレッドとコンシューマー1スレッドから共有されることを想定しています。
#[derive(Debug, Default)]
pub struct SuppressionDictionary {
    published: RwLock<Arc<Snapshot>>,
    // Some while the producer holds the lock.
    staging: Mutex<Option<Snapshot>>,
}

impl SuppressionDictionary {
    /// 空の抑制辞書を作成します。
    pub fn new() -> Self {
        Self::default()
    }

    fn publish(&self, snapshot: Arc<Snapshot>) {
        match self.published.write() {
            Ok(mut published) => *published = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }

    fn current(&self) -> Arc<Snapshot> {
        match self.published.try_read() {
            Ok(snapshot) => Arc::clone(&snapshot),
            Err(TryLockError::Poisoned(poisoned)) => Arc::clone(&poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Arc::default(),
        }
    }

    fn staging(&self) -> std::sync::MutexGuard<'_, Option<Snapshot>> {
        self.staging
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// プロデューサーの書き込み区間を開始します。
    ///
    /// 以降`unlock()`まで、コンシューマーからは空集合に見えます。
    ///
    /// # パニック
    ///
    /// 再帰的に呼び出した場合にパニックします。
    pub fn lock(&self) {
        let mut staging = self.staging();
        assert!(
            staging.is_none(),
            "SuppressionDictionary::lock() must not be called recursively"
        );
        let current = self.current();
        *staging = Some(Snapshot::clone(&current));
        self.publish(Arc::default());
    }

    /// 書き込み区間を終了し、変更後の集合を公開します。
    pub fn unlock(&self) {
        let mut staging = self.staging();
        let Some(snapshot) = staging.take() else {
            log::warn!("[kotoba] SuppressionDictionary::unlock() called without lock()");
            return;
        };
        self.publish(Arc::new(snapshot));
    }

    /// プロデューサーがロック中かどうかを返します。
    pub fn is_locked(&self) -> bool {
        self.staging().is_some()
    }

    /// エントリを追加します。ロック中のみ有効です。
    ///
    /// 空の読みは任意の読みに、空の表記は任意の表記に一致します。
    /// 読みと表記がともに空の場合、またはロックされていない場合は`false`を返します。
    pub fn add_entry(&self, key: &str, value: &str) -> bool {
        let mut staging = self.staging();
        let Some(snapshot) = staging.as_mut() else {
            log::error!("[kotoba] SuppressionDictionary::add_entry() called without lock()");
            return false;
        };
        if key.is_empty() && value.is_empty() {
            log::warn!("[kotoba] Both key and value of a suppression entry are empty");
            return false;
        }
        snapshot.has_key_empty |= key.is_empty();
        snapshot.has_value_empty |= value.is_empty();
        snapshot.entries.insert(Snapshot::entry_key(key, value));
        true
    }

    /// すべてのエントリを削除します。ロック中のみ有効です。
    pub fn clear(&self) {
        let mut staging = self.staging();
        match staging.as_mut() {
            Some(snapshot) => *snapshot = Snapshot::default(),
            None => log::error!("[kotoba] SuppressionDictionary::clear() called without lock()"),
        }
    }

    /// 公開済みの集合が空かどうかを返します。ロック中は常に`true`です。
    pub fn is_empty(&self) -> bool {
        self.current().entries.is_empty()
    }

    /// (読み, 表記) を抑制すべきかどうかを返します。ロック中は常に`false`です。
    pub fn suppress_entry(&self, key: &str, value: &str) -> bool {
        self.current().suppress(key, value)
    }
}
