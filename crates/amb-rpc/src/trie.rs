//! A minimal Ethereum Merkle-Patricia trie, built and proved by hand rather
//! than through `trie-db`'s generic `NodeCodec`/`TrieLayout` machinery: this
//! crate only ever needs one concrete hasher (keccak256) and one concrete
//! encoding (RLP), so the generic trait surface buys nothing. Ported from
//! the shape of `go-ethereum/trie`'s `Trie.Update`/`Trie.Prove`, which
//! `execute_log/main.go` drives directly.

use tiny_keccak::{Hasher, Keccak};

fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut out = [0u8; 32];
    hasher.finalize(&mut out);
    out
}

fn bytes_to_nibbles(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(b >> 4);
        out.push(b & 0x0f);
    }
    out
}

/// Hex-prefix encoding (Ethereum Yellow Paper appendix C): packs a nibble
/// path plus a leaf/extension flag into bytes.
fn hex_prefix_encode(nibbles: &[u8], is_leaf: bool) -> Vec<u8> {
    let odd = nibbles.len() % 2 == 1;
    let mut flag = if is_leaf { 0x2u8 } else { 0x0u8 };
    let mut out = Vec::with_capacity(nibbles.len() / 2 + 1);
    if odd {
        flag |= 0x1;
        out.push((flag << 4) | nibbles[0]);
        for pair in nibbles[1..].chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    } else {
        out.push(flag << 4);
        for pair in nibbles.chunks(2) {
            out.push((pair[0] << 4) | pair[1]);
        }
    }
    out
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

#[derive(Clone, Debug)]
enum Node {
    Empty,
    Leaf { path: Vec<u8>, value: Vec<u8> },
    Extension { path: Vec<u8>, child: Box<Node> },
    Branch { children: Box<[Node; 16]>, value: Option<Vec<u8>> },
}

fn empty_branch() -> Box<[Node; 16]> {
    Box::new(std::array::from_fn(|_| Node::Empty))
}

fn insert(node: Node, nibbles: &[u8], new_value: Vec<u8>) -> Node {
    match node {
        Node::Empty => Node::Leaf { path: nibbles.to_vec(), value: new_value },
        Node::Leaf { path, value: old_value } => {
            let common = common_prefix_len(&path, nibbles);
            if common == path.len() && common == nibbles.len() {
                return Node::Leaf { path, value: new_value };
            }
            let mut children = empty_branch();
            let mut branch_value = None;
            if common == path.len() {
                branch_value = Some(old_value);
            } else {
                children[path[common] as usize] =
                    Node::Leaf { path: path[common + 1..].to_vec(), value: old_value };
            }
            if common == nibbles.len() {
                branch_value = Some(new_value);
            } else {
                children[nibbles[common] as usize] =
                    Node::Leaf { path: nibbles[common + 1..].to_vec(), value: new_value };
            }
            let branch = Node::Branch { children, value: branch_value };
            if common == 0 {
                branch
            } else {
                Node::Extension { path: path[..common].to_vec(), child: Box::new(branch) }
            }
        }
        Node::Extension { path, child } => {
            let common = common_prefix_len(&path, nibbles);
            if common == path.len() {
                let new_child = insert(*child, &nibbles[common..], new_value);
                return Node::Extension { path, child: Box::new(new_child) };
            }
            let mut children = empty_branch();
            let remaining_ext = path[common + 1..].to_vec();
            let ext_child =
                if remaining_ext.is_empty() { *child } else { Node::Extension { path: remaining_ext, child } };
            children[path[common] as usize] = ext_child;

            let mut branch_value = None;
            if common == nibbles.len() {
                branch_value = Some(new_value);
            } else {
                children[nibbles[common] as usize] =
                    Node::Leaf { path: nibbles[common + 1..].to_vec(), value: new_value };
            }
            let branch = Node::Branch { children, value: branch_value };
            if common == 0 {
                branch
            } else {
                Node::Extension { path: path[..common].to_vec(), child: Box::new(branch) }
            }
        }
        Node::Branch { mut children, value } => {
            if nibbles.is_empty() {
                Node::Branch { children, value: Some(new_value) }
            } else {
                let idx = nibbles[0] as usize;
                let existing = std::mem::replace(&mut children[idx], Node::Empty);
                children[idx] = insert(existing, &nibbles[1..], new_value);
                Node::Branch { children, value }
            }
        }
    }
}

fn append_child_ref(stream: &mut rlp::RlpStream, node: &Node) {
    match node {
        Node::Empty => {
            stream.append_empty_data();
        }
        _ => {
            let encoded = encode_node(node);
            if encoded.len() < 32 {
                stream.append_raw(&encoded, 1);
            } else {
                let hash = keccak256(&encoded);
                stream.append(&hash.as_slice());
            }
        }
    }
}

fn encode_node(node: &Node) -> Vec<u8> {
    match node {
        Node::Empty => rlp::NULL_RLP.to_vec(),
        Node::Leaf { path, value } => {
            let mut s = rlp::RlpStream::new_list(2);
            s.append(&hex_prefix_encode(path, true));
            s.append(value);
            s.out().to_vec()
        }
        Node::Extension { path, child } => {
            let mut s = rlp::RlpStream::new_list(2);
            s.append(&hex_prefix_encode(path, false));
            append_child_ref(&mut s, child);
            s.out().to_vec()
        }
        Node::Branch { children, value } => {
            let mut s = rlp::RlpStream::new_list(17);
            for child in children.iter() {
                append_child_ref(&mut s, child);
            }
            match value {
                Some(v) => {
                    s.append(v);
                }
                None => {
                    s.append_empty_data();
                }
            }
            s.out().to_vec()
        }
    }
}

fn collect_proof(node: &Node, nibbles: &[u8], proof: &mut Vec<Vec<u8>>) {
    proof.push(encode_node(node));
    match node {
        Node::Leaf { .. } | Node::Empty => {}
        Node::Extension { path, child } => {
            if nibbles.len() >= path.len() && &nibbles[..path.len()] == path.as_slice() {
                collect_proof(child, &nibbles[path.len()..], proof);
            }
        }
        Node::Branch { children, .. } => {
            if let Some((&first, rest)) = nibbles.split_first() {
                collect_proof(&children[first as usize], rest, proof);
            }
        }
    }
}

/// An in-memory keyed trie, used here for the per-block receipts trie
/// (`receiptsRoot`). Keys are RLP-encoded transaction indices, matching
/// `rlp.AppendUint64` in the original.
#[derive(Default)]
pub struct OrderedTrie {
    root: Node,
}

impl OrderedTrie {
    pub fn new() -> Self {
        Self { root: Node::Empty }
    }

    pub fn insert(&mut self, key: &[u8], value: Vec<u8>) {
        let nibbles = bytes_to_nibbles(key);
        let root = std::mem::replace(&mut self.root, Node::Empty);
        self.root = insert(root, &nibbles, value);
    }

    pub fn root_hash(&self) -> [u8; 32] {
        keccak256(&encode_node(&self.root))
    }

    /// The ordered list of RLP-encoded nodes visited from the root down to
    /// `key`'s leaf, exactly as `go-ethereum/trie.Trie.Prove` collects them
    /// into its `OrderedDB`.
    pub fn prove(&self, key: &[u8]) -> Vec<Vec<u8>> {
        let nibbles = bytes_to_nibbles(key);
        let mut proof = Vec::new();
        collect_proof(&self.root, &nibbles, &mut proof);
        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entry_root_matches_direct_rlp_hash() {
        let mut trie = OrderedTrie::new();
        let key = rlp::encode(&0u64).to_vec();
        let value = b"hello".to_vec();
        trie.insert(&key, value.clone());

        let nibbles = bytes_to_nibbles(&key);
        let leaf = Node::Leaf { path: nibbles, value };
        assert_eq!(trie.root_hash(), keccak256(&encode_node(&leaf)));
    }

    #[test]
    fn proof_for_inserted_key_starts_at_root() {
        let mut trie = OrderedTrie::new();
        for i in 0..8u64 {
            let key = rlp::encode(&i).to_vec();
            trie.insert(&key, format!("value-{i}").into_bytes());
        }
        let key = rlp::encode(&3u64).to_vec();
        let proof = trie.prove(&key);
        assert!(!proof.is_empty());
        assert_eq!(keccak256(&proof[0]), trie.root_hash());
    }

    #[test]
    fn distinct_keys_produce_distinct_roots() {
        let mut a = OrderedTrie::new();
        a.insert(&rlp::encode(&0u64), b"x".to_vec());
        let mut b = OrderedTrie::new();
        b.insert(&rlp::encode(&0u64), b"y".to_vec());
        assert_ne!(a.root_hash(), b.root_hash());
    }
}
