use std::collections::HashMap;

use crate::{Post, Thread};

/// Position of one post in the reply tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplyEntry {
    /// Index into `Thread::posts`.
    pub index: usize,
    /// Zero for top-level posts.
    pub depth: usize,
}

/// Depth-first walk of the reply tree: each post is followed by its replies,
/// siblings keep display order.
///
/// A parent reference only counts when it names a post shown earlier in the
/// thread; anything else (unknown id, forward or self reference) makes the post
/// top-level. The walk therefore visits every post exactly once.
pub fn reply_order(thread: &Thread) -> Vec<ReplyEntry> {
    reply_order_of(&thread.posts)
}

/// [`reply_order`] over any run of posts, such as the posts of one page.
/// Indices are relative to `posts`; parents outside the slice make a root.
pub fn reply_order_of(posts: &[Post]) -> Vec<ReplyEntry> {
    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(posts.len());
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); posts.len()];
    let mut roots = Vec::new();

    for (index, post) in posts.iter().enumerate() {
        let parent = post
            .parent
            .as_deref()
            .and_then(|id| seen.get(id).copied());
        match parent {
            Some(parent) => children[parent].push(index),
            None => roots.push(index),
        }
        seen.entry(post.id.as_str()).or_insert(index);
    }

    let mut order = Vec::with_capacity(posts.len());
    let mut stack: Vec<ReplyEntry> = roots
        .iter()
        .rev()
        .map(|&index| ReplyEntry { index, depth: 0 })
        .collect();
    while let Some(entry) = stack.pop() {
        order.push(entry);
        for &child in children[entry.index].iter().rev() {
            stack.push(ReplyEntry {
                index: child,
                depth: entry.depth + 1,
            });
        }
    }
    order
}
