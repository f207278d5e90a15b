//! 圧縮トライ
//!
//! [`LoudsTrie`]は値辞書が必要とするトライ操作の集合です。
//! [`TrieIndex`]はノードを幅優先順に並べた実装で、rkyvで直列化したイメージを
//! [`ArchivedTrieIndex`]としてコピーなしに参照できます。

use std::collections::VecDeque;

use rkyv::rancor::Error;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::errors::{KotobaError, Result};
use crate::utils::FromU32;

/// トライのノード番号
pub type NodeId = u32;

/// 値辞書が利用するトライ操作
pub trait LoudsTrie {
    /// 根ノードを返します。
    fn root(&self) -> NodeId;

    /// 根から`key`のバイト列をたどり、到達したノードを返します。
    fn traverse(&self, key: &[u8]) -> Option<NodeId>;

    /// ノードが登録済みのキーの終端かどうかを返します。
    fn is_terminal(&self, node: NodeId) -> bool;

    /// 最初の子ノードを返します。
    fn first_child(&self, node: NodeId) -> Option<NodeId>;

    /// 次の兄弟ノードを返します。
    fn next_sibling(&self, node: NodeId) -> Option<NodeId>;

    /// 根からノードまでのラベル列を`buf`の末尾に書き出します。
    fn restore_key(&self, node: NodeId, buf: &mut Vec<u8>);
}

/// トライのノード
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Archive, Serialize, Deserialize)]
pub struct TrieNode {
    label: u8,
    terminal: bool,
    parent: u32,
    first_child: u32,
    num_children: u32,
}

impl ArchivedTrieNode {
    /// ネイティブ形式に変換します。
    #[inline(always)]
    pub fn to_native(&self) -> TrieNode {
        TrieNode {
            label: self.label,
            terminal: self.terminal,
            parent: self.parent.to_native(),
            first_child: self.first_child.to_native(),
            num_children: self.num_children.to_native(),
        }
    }
}

/// ノードを幅優先順に並べたトライ
///
/// 兄弟ノードは連続した番号を持ち、ラベルの昇順に並びます。
#[derive(Debug, Archive, Serialize, Deserialize)]
pub struct TrieIndex {
    nodes: Vec<TrieNode>,
}

impl TrieIndex {
    /// キーの集合からトライを構築します。重複は無視します。
    ///
    /// # エラー
    ///
    /// ノード数がu32に収まらない場合にエラーを返します。
    pub fn from_keys<I, K>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<[u8]>,
    {
        let mut keys: Vec<Vec<u8>> = keys.into_iter().map(|k| k.as_ref().to_vec()).collect();
        keys.sort_unstable();
        keys.dedup();

        let mut nodes = vec![TrieNode::default()];
        let mut queue = VecDeque::from([(0usize, 0usize, 0..keys.len())]);
        while let Some((idx, depth, range)) = queue.pop_front() {
            let mut i = range.start;
            if i < range.end && keys[i].len() == depth {
                nodes[idx].terminal = true;
                i += 1;
            }
            let first_child = nodes.len();
            while i < range.end {
                let label = keys[i][depth];
                let mut j = i + 1;
                while j < range.end && keys[j][depth] == label {
                    j += 1;
                }
                queue.push_back((nodes.len(), depth + 1, i..j));
                nodes.push(TrieNode {
                    label,
                    parent: u32::try_from(idx)?,
                    ..TrieNode::default()
                });
                i = j;
            }
            nodes[idx].first_child = u32::try_from(first_child)?;
            nodes[idx].num_children = u32::try_from(nodes.len() - first_child)?;
        }
        u32::try_from(nodes.len())?;
        Ok(Self { nodes })
    }

    /// ノード数を返します。
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// rkyv形式に直列化します。
    ///
    /// # エラー
    ///
    /// 直列化に失敗した場合にエラーを返します。
    pub fn to_bytes(&self) -> Result<AlignedVec> {
        Ok(rkyv::to_bytes::<Error>(self)?)
    }

    /// 直列化されたイメージを検証し、コピーせずに参照します。
    ///
    /// `bytes`は[`to_bytes`](Self::to_bytes)の出力と同じアライメントを満たす必要があります。
    ///
    /// # エラー
    ///
    /// 検証に失敗した場合、またはノードの参照が範囲外の場合にエラーを返します。
    pub fn access(bytes: &[u8]) -> Result<&ArchivedTrieIndex> {
        let archived = rkyv::access::<ArchivedTrieIndex, Error>(bytes).map_err(|e| {
            KotobaError::invalid_state(
                "rkyv validation failed. The trie image may be corrupted or incompatible.",
                e.to_string(),
            )
        })?;
        if !has_valid_links(archived) {
            return Err(KotobaError::invalid_format(
                "trie",
                "The trie image contains dangling or cyclic node links.",
            ));
        }
        Ok(archived)
    }
}

/// ノード表へのアクセス
trait NodeTable {
    fn num_nodes(&self) -> usize;
    fn node(&self, id: NodeId) -> TrieNode;
}

impl NodeTable for TrieIndex {
    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    fn node(&self, id: NodeId) -> TrieNode {
        self.nodes[usize::from_u32(id)]
    }
}

impl NodeTable for ArchivedTrieIndex {
    #[inline(always)]
    fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    #[inline(always)]
    fn node(&self, id: NodeId) -> TrieNode {
        self.nodes[usize::from_u32(id)].to_native()
    }
}

/// ノードの参照が幅優先順の木構造をなしているかを検証します。
///
/// 根以外のノードは自身より前の親を持ち、親の子の範囲に含まれなければなりません。
/// 子の範囲は自身より後ろにあり、兄弟のラベルは狭義の昇順です。
/// これを満たすイメージでは、探索と復元が必ず停止します。
fn has_valid_links<T: NodeTable>(table: &T) -> bool {
    let len = table.num_nodes();
    if len == 0 || u32::try_from(len).is_err() {
        return false;
    }
    for i in 0..len {
        // `len` fits in u32.
        let id = i as NodeId;
        let n = table.node(id);
        if i != 0 {
            if n.parent >= id {
                return false;
            }
            let p = table.node(n.parent);
            if id < p.first_child || id - p.first_child >= p.num_children {
                return false;
            }
        }
        if n.num_children == 0 {
            continue;
        }
        let Some(end) = n.first_child.checked_add(n.num_children) else {
            return false;
        };
        if n.first_child <= id || usize::from_u32(end) > len {
            return false;
        }
        let mut prev_label = None;
        for c in n.first_child..end {
            let child = table.node(c);
            if child.parent != id || prev_label.is_some_and(|l| l >= child.label) {
                return false;
            }
            prev_label = Some(child.label);
        }
    }
    true
}

fn traverse<T: NodeTable>(table: &T, key: &[u8]) -> Option<NodeId> {
    let mut node = 0;
    for &b in key {
        let n = table.node(node);
        let (mut lo, mut hi) = (n.first_child, n.first_child + n.num_children);
        // Siblings are sorted by label.
        loop {
            if lo >= hi {
                return None;
            }
            let mid = lo + (hi - lo) / 2;
            let label = table.node(mid).label;
            if label == b {
                node = mid;
                break;
            } else if label < b {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
    }
    Some(node)
}

fn next_sibling<T: NodeTable>(table: &T, node: NodeId) -> Option<NodeId> {
    if node == 0 {
        return None;
    }
    let next = node + 1;
    (usize::from_u32(next) < table.num_nodes()
        && table.node(next).parent == table.node(node).parent)
        .then_some(next)
}

fn restore_key<T: NodeTable>(table: &T, mut node: NodeId, buf: &mut Vec<u8>) {
    let start = buf.len();
    while node != 0 {
        let n = table.node(node);
        buf.push(n.label);
        node = n.parent;
    }
    buf[start..].reverse();
}

impl LoudsTrie for TrieIndex {
    fn root(&self) -> NodeId {
        0
    }

    fn traverse(&self, key: &[u8]) -> Option<NodeId> {
        traverse(self, key)
    }

    fn is_terminal(&self, node: NodeId) -> bool {
        self.node(node).terminal
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node);
        (n.num_children != 0).then_some(n.first_child)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        next_sibling(self, node)
    }

    fn restore_key(&self, node: NodeId, buf: &mut Vec<u8>) {
        restore_key(self, node, buf)
    }
}

impl LoudsTrie for ArchivedTrieIndex {
    fn root(&self) -> NodeId {
        0
    }

    fn traverse(&self, key: &[u8]) -> Option<NodeId> {
        traverse(self, key)
    }

    fn is_terminal(&self, node: NodeId) -> bool {
        self.node(node).terminal
    }

    fn first_child(&self, node: NodeId) -> Option<NodeId> {
        let n = self.node(node);
        (n.num_children != 0).then_some(n.first_child)
    }

    fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        next_sibling(self, node)
    }

    fn restore_key(&self, node: NodeId, buf: &mut Vec<u8>) {
        restore_key(self, node, buf)
    }
}
