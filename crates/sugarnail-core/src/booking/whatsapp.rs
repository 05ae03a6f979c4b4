//! Order hand-off to the admin over WhatsApp.

use super::format::format_rupiah;
use super::models::Order;

/// The order message as the admin receives it.
pub fn order_message(order: &Order) -> String {
    let mut message = String::from("Halo Sugar Nail Art 💅\n\nSaya ingin order nail art:\n\n");
    message.push_str(&format!("✨ Paket: {}\n", order.package_name));
    message.push_str(&format!("💰 Harga: {}\n\n", format_rupiah(order.package_price)));

    if !order.addons.is_empty() {
        message.push_str("➕ Add-ons:\n");
        for addon in &order.addons {
            message.push_str(&format!("- {} (+{})\n", addon.name, format_rupiah(addon.price)));
        }
        message.push('\n');
    }

    if order.has_notes() {
        message.push_str(&format!("📝 Catatan:\n{}\n\n", order.notes));
    }

    message.push_str(&format!("Total: {}\n\n", format_rupiah(order.total)));
    message.push_str("Terima kasih 😊");
    message
}

/// `wa.me` link that opens a chat with `admin_number` prefilled with the order.
pub fn whatsapp_link(order: &Order, admin_number: &str) -> String {
    format!(
        "https://wa.me/{}?text={}",
        admin_number,
        urlencoding::encode(&order_message(order))
    )
}
