use todo_core::TodoItem;

pub(crate) fn format_item(item: &TodoItem) -> String {
    let mark = if item.is_completed { "x" } else { " " };
    format!("[{mark}] {}", item.title)
}

pub(crate) fn print_item_table(items: &[TodoItem]) {
    let id_width = items
        .iter()
        .map(|item| item.id.to_string().len())
        .fold("ID".len(), usize::max);

    println!("{:<id_width$}  ITEM", "ID", id_width = id_width);
    for item in items {
        println!(
            "{:<id_width$}  {}",
            item.id,
            format_item(item),
            id_width = id_width
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_items_are_checked() {
        let mut item = TodoItem::new("milk");
        assert_eq!(format_item(&item), "[ ] milk");
        item.is_completed = true;
        assert_eq!(format_item(&item), "[x] milk");
    }
}
