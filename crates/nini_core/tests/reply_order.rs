use nini_core::{reply_order, reply_order_of, Markup, Post, Thread, ThreadMeta};
use pretty_assertions::assert_eq;
use url::Url;

fn post(id: &str, parent: Option<&str>) -> Post {
    let mut post = Post::new(id, format!("author-{id}"), Markup::from_text(id));
    post.parent = parent.map(str::to_string);
    post
}

fn thread(posts: Vec<Post>) -> Thread {
    Thread {
        id: "42".to_string(),
        title: "t".to_string(),
        source_url: Url::parse("https://example.com/topic/42").unwrap(),
        meta: ThreadMeta::default(),
        posts,
    }
}

fn walk(thread: &Thread) -> Vec<(String, usize)> {
    reply_order(thread)
        .into_iter()
        .map(|entry| (thread.posts[entry.index].id.clone(), entry.depth))
        .collect()
}

#[test]
fn replies_follow_their_parent_at_increasing_depth() {
    let t = thread(vec![
        post("1", None),
        post("2", None),
        post("3", Some("1")),
        post("4", Some("3")),
        post("5", Some("2")),
        post("6", Some("1")),
    ]);

    assert_eq!(
        walk(&t),
        vec![
            ("1".to_string(), 0),
            ("3".to_string(), 1),
            ("4".to_string(), 2),
            ("6".to_string(), 1),
            ("2".to_string(), 0),
            ("5".to_string(), 1),
        ]
    );
}

#[test]
fn unknown_forward_and_self_parents_become_top_level() {
    let t = thread(vec![
        post("1", Some("3")),
        post("2", Some("missing")),
        post("3", Some("3")),
    ]);

    assert_eq!(
        walk(&t),
        vec![
            ("1".to_string(), 0),
            ("2".to_string(), 0),
            ("3".to_string(), 0),
        ]
    );
}

#[test]
fn every_post_is_visited_once() {
    let posts: Vec<Post> = (0..50)
        .map(|i| {
            let parent = if i == 0 { None } else { Some((i / 2).to_string()) };
            post(&i.to_string(), parent.as_deref())
        })
        .collect();
    let t = thread(posts);

    let mut indices: Vec<usize> = reply_order(&t).into_iter().map(|e| e.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..50).collect::<Vec<_>>());
}

#[test]
fn a_slice_treats_outside_parents_as_roots() {
    let posts = vec![post("1", None), post("2", Some("1")), post("3", Some("2")), post("4", Some("1"))];

    let order: Vec<(usize, usize)> = reply_order_of(&posts[2..])
        .into_iter()
        .map(|entry| (entry.index, entry.depth))
        .collect();
    assert_eq!(order, vec![(0, 0), (1, 0)]);
}
